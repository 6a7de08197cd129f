use pregel_common::types::ShardId;

/// Resolves which shards a vertex writes its result to and reads its edges from.
pub trait ShardMapping: Send + Sync {
    fn result_shard_for(&self, origin_shard: &str) -> Option<ShardId>;

    /// Edge shards the vertex is responsible for, in the order they must be scanned.
    fn edge_shards_for(&self, origin_shard: &str) -> Option<Vec<ShardId>>;
}
