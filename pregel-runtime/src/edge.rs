use pregel_api::storage::ShardStore;
use pregel_common::error::PregelResult;
use pregel_common::types::{RawEdgeDocument, ShardId};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const RESULT_FIELD: &str = "result";

/// An outgoing edge of a vertex, as read from one of its responsible edge shards.
pub struct Edge {
    doc: RawEdgeDocument,
    shard: ShardId,
    result: Option<Value>,
    store: Arc<dyn ShardStore>,
}

impl Edge {
    pub fn new(
        doc: RawEdgeDocument,
        shard: impl Into<ShardId>,
        store: Arc<dyn ShardStore>,
    ) -> Self {
        Self {
            doc,
            shard: shard.into(),
            result: None,
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.doc.id
    }

    pub fn from(&self) -> &str {
        &self.doc.from
    }

    pub fn to(&self) -> &str {
        &self.doc.to
    }

    /// The shard this edge was loaded from and is saved back to.
    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.doc.payload
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    pub fn save(&self) -> PregelResult<()> {
        let mut doc = self.doc.clone();
        if let Some(result) = &self.result {
            doc.payload.insert(RESULT_FIELD.to_string(), result.clone());
        }
        self.store.write_edge_document(&self.shard, &doc)
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.doc.id)
            .field("from", &self.doc.from)
            .field("to", &self.doc.to)
            .field("shard", &self.shard)
            .finish()
    }
}
