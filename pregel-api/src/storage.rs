use pregel_common::error::PregelResult;
use pregel_common::types::{RawEdgeDocument, ResultDocument};

/// Narrow read/write interface onto the sharded document store.
///
/// Backend failures are reported as `PregelError::StorageUnavailable`.
pub trait ShardStore: Send + Sync {
    /// All edges in `edge_shard` whose source is `vertex_id`, in storage order.
    fn read_out_edges(
        &self,
        edge_shard: &str,
        vertex_id: &str,
    ) -> PregelResult<Vec<RawEdgeDocument>>;

    fn read_result_document(&self, result_shard: &str, key: &str) -> PregelResult<ResultDocument>;

    fn write_result_document(&self, result_shard: &str, doc: &ResultDocument) -> PregelResult<()>;

    fn write_edge_document(&self, edge_shard: &str, doc: &RawEdgeDocument) -> PregelResult<()>;
}
