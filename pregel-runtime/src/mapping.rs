use pregel_api::shard::ShardMapping;
use pregel_common::error::{PregelError, PregelResult};
use pregel_common::types::ShardId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardAssignment {
    pub result_shard: ShardId,
    pub edge_shards: Vec<ShardId>,
}

/// A fixed origin-shard to result/edge-shard table, typically shipped to a
/// worker by the coordinator as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticShardMapping {
    assignments: HashMap<ShardId, ShardAssignment>,
}

impl StaticShardMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign<I, S>(
        mut self,
        origin_shard: impl Into<ShardId>,
        result_shard: impl Into<ShardId>,
        edge_shards: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ShardId>,
    {
        self.assignments.insert(
            origin_shard.into(),
            ShardAssignment {
                result_shard: result_shard.into(),
                edge_shards: edge_shards.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> PregelResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(PregelError::Io)?;
        }
        let s = serde_json::to_string_pretty(self)
            .map_err(|e| PregelError::Internal(format!("{e}")))?;
        std::fs::write(path, s).map_err(PregelError::Io)
    }

    pub fn read_json(path: impl AsRef<Path>) -> PregelResult<Self> {
        let s = std::fs::read_to_string(path).map_err(PregelError::Io)?;
        serde_json::from_str(&s).map_err(|e| PregelError::Configuration(format!("{e}")))
    }
}

impl ShardMapping for StaticShardMapping {
    fn result_shard_for(&self, origin_shard: &str) -> Option<ShardId> {
        self.assignments
            .get(origin_shard)
            .map(|a| a.result_shard.clone())
    }

    fn edge_shards_for(&self, origin_shard: &str) -> Option<Vec<ShardId>> {
        self.assignments
            .get(origin_shard)
            .map(|a| a.edge_shards.clone())
    }
}
