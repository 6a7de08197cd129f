use pregel_api::registry::VertexRegistry;
use pregel_api::storage::ShardStore;
use pregel_common::error::PregelError;
use pregel_common::types::{RawEdgeDocument, RawVertexDocument, ResultDocument};
use pregel_runtime::mapping::StaticShardMapping;
use pregel_runtime::partition::PartitionContext;
use pregel_runtime::state::RocksDbShardStore;
use pregel_runtime::vertex::{Vertex, VertexConfig, VertexState};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_rocksdb_out_edges_are_scoped_to_shard_and_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksDbShardStore::open(dir.path()).unwrap();

    store
        .put_edge_batch(
            "e1",
            &[
                RawEdgeDocument::new("edges/a", "a", "v/1", "v/2"),
                RawEdgeDocument::new("edges/b", "b", "v/1", "v/3"),
                RawEdgeDocument::new("edges/c", "c", "v/10", "v/1"),
            ],
        )
        .unwrap();
    store
        .put_edge_batch("e2", &[RawEdgeDocument::new("edges/d", "d", "v/1", "v/4")])
        .unwrap();

    let out = store.read_out_edges("e1", "v/1").unwrap();
    let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["edges/a", "edges/b"]);

    assert_eq!(store.read_out_edges("e1", "v/10").unwrap().len(), 1);
    assert_eq!(store.read_out_edges("e2", "v/1").unwrap().len(), 1);
    assert!(store.read_out_edges("e3", "v/1").unwrap().is_empty());
}

#[test]
fn test_rocksdb_result_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksDbShardStore::open(dir.path()).unwrap();
    let doc = ResultDocument {
        key: "7".to_string(),
        deleted: false,
        result: json!({ "sum": 42 }),
    };

    store.write_result_document("r1", &doc).unwrap();
    assert_eq!(store.read_result_document("r1", "7").unwrap(), doc);
    assert!(matches!(
        store.read_result_document("r2", "7"),
        Err(PregelError::DocumentNotFound { .. })
    ));
}

#[test]
fn test_rocksdb_checkpoint_keeps_evicted_result() {
    let dir = tempfile::tempdir().unwrap();
    let rocks = RocksDbShardStore::open(dir.path()).unwrap();
    rocks
        .put_edge_batch("e1", &[RawEdgeDocument::new("edges/a", "a", "v/1", "v/2")])
        .unwrap();

    let store: Arc<dyn ShardStore> = Arc::new(rocks.clone());
    let context = Arc::new(PartitionContext::new());
    let registry: Arc<dyn VertexRegistry> = context.clone();
    let mapping = StaticShardMapping::new().assign("s1", "r1", ["e1"]);
    let mut v = Vertex::new(
        RawVertexDocument::new("v/1", "1", "s1"),
        &mapping,
        store,
        registry,
        VertexConfig::default(),
    )
    .unwrap();
    context.register(v.id());

    v.out_edges_mut()[0].set_result(json!(1.5));
    v.set_result(json!({ "sum": 42 }));
    v.deactivate();
    for _ in 0..4 {
        v.record_inactive_tick().unwrap();
    }
    assert_eq!(v.state(), VertexState::InactiveEvicted);

    let checkpoint_dir = tempfile::tempdir().unwrap();
    let checkpoint_path = checkpoint_dir.path().join("cp");
    rocks.create_checkpoint(&checkpoint_path).unwrap();

    let recovered = RocksDbShardStore::open(&checkpoint_path).unwrap();
    let result = recovered.read_result_document("r1", "1").unwrap();
    assert_eq!(result.result, json!({ "sum": 42 }));
    let edges = recovered.read_out_edges("e1", "v/1").unwrap();
    assert_eq!(edges[0].payload.get("result"), Some(&json!(1.5)));

    v.activate().unwrap();
    assert_eq!(v.result(), &json!({ "sum": 42 }));
    assert_eq!(context.active_count(), 1);
}
