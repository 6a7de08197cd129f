use crate::error::{PregelError, PregelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shards are addressed by name.
pub type ShardId = String;

/// The value a vertex holds before computing anything, and after eviction.
pub fn empty_result() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationInfo {
    pub shard: ShardId,
}

/// A vertex document as stored in its origin shard.
///
/// Only the identity and location fields are interpreted; everything else is
/// carried in `payload` for the job's compute function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawVertexDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_locationInfo")]
    pub location: LocationInfo,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawVertexDocument {
    pub fn new(id: impl Into<String>, key: impl Into<String>, shard: impl Into<ShardId>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            location: LocationInfo {
                shard: shard.into(),
            },
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.payload.insert(name.into(), value);
        self
    }

    pub fn from_value(value: Value) -> PregelResult<Self> {
        serde_json::from_value(value).map_err(|e| PregelError::InvalidDocument(format!("{e}")))
    }

    pub fn shard(&self) -> &str {
        &self.location.shard
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEdgeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_from")]
    pub from: String,
    #[serde(rename = "_to")]
    pub to: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RawEdgeDocument {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            from: from.into(),
            to: to.into(),
            payload: Map::new(),
        }
    }
}

/// The document a vertex persists into its result shard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultDocument {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vertex_document_splits_identity_from_payload() {
        let doc = RawVertexDocument::from_value(json!({
            "_id": "vertices/7",
            "_key": "7",
            "_locationInfo": { "shard": "s100" },
            "weight": 3
        }))
        .unwrap();

        assert_eq!(doc.id, "vertices/7");
        assert_eq!(doc.key, "7");
        assert_eq!(doc.shard(), "s100");
        assert_eq!(doc.payload.get("weight"), Some(&json!(3)));
        assert!(!doc.payload.contains_key("_id"));
    }

    #[test]
    fn vertex_document_without_location_is_rejected() {
        let err = RawVertexDocument::from_value(json!({ "_id": "vertices/7", "_key": "7" }))
            .unwrap_err();
        assert!(matches!(err, PregelError::InvalidDocument(_)));
    }

    #[test]
    fn result_document_uses_underscored_system_fields() {
        let doc = ResultDocument {
            key: "7".to_string(),
            deleted: false,
            result: json!({ "sum": 42 }),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "_key": "7", "_deleted": false, "result": { "sum": 42 } })
        );
    }
}
