use pregel_api::registry::VertexRegistry;
use pregel_api::storage::ShardStore;
use pregel_common::types::{RawEdgeDocument, RawVertexDocument};
use pregel_runtime::mapping::StaticShardMapping;
use pregel_runtime::partition::PartitionContext;
use pregel_runtime::state::MemoryShardStore;
use pregel_runtime::vertex::{Vertex, VertexConfig, VertexState};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

const VERTICES: usize = 5;

#[derive(Debug, Clone, Copy)]
enum Op {
    Activate,
    Deactivate,
    Delete,
    Tick,
}

fn op_strategy() -> impl Strategy<Value = (usize, Op)> {
    let op = prop_oneof![
        Just(Op::Activate),
        Just(Op::Deactivate),
        Just(Op::Delete),
        Just(Op::Tick),
    ];
    (0..VERTICES, op)
}

fn build() -> (Arc<PartitionContext>, Vec<Vertex>) {
    let store = Arc::new(MemoryShardStore::new());
    for i in 0..VERTICES {
        store.insert_edge(
            "e1",
            RawEdgeDocument::new(
                format!("edges/{i}"),
                i.to_string(),
                format!("v/{i}"),
                format!("v/{}", (i + 1) % VERTICES),
            ),
        );
    }
    let store: Arc<dyn ShardStore> = store;
    let context = Arc::new(PartitionContext::new());
    let registry: Arc<dyn VertexRegistry> = context.clone();
    let mapping = StaticShardMapping::new().assign("s1", "r1", ["e1"]);

    let vertices = (0..VERTICES)
        .map(|i| {
            let mut v = Vertex::new(
                RawVertexDocument::new(format!("v/{i}"), i.to_string(), "s1"),
                &mapping,
                Arc::clone(&store),
                Arc::clone(&registry),
                VertexConfig::default(),
            )
            .unwrap();
            v.set_result(json!({ "n": i }));
            assert!(context.register(v.id()));
            v
        })
        .collect();
    (context, vertices)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn active_count_matches_active_vertices(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let (context, mut vertices) = build();

        for (idx, op) in ops {
            let v = &mut vertices[idx];
            match op {
                Op::Activate => v.activate().unwrap(),
                Op::Deactivate => v.deactivate(),
                Op::Delete => v.delete().unwrap(),
                Op::Tick => v.record_inactive_tick().unwrap(),
            }

            let active = vertices.iter().filter(|v| v.is_active()).count();
            prop_assert_eq!(context.active_count(), active);

            for v in &vertices {
                prop_assert_eq!(v.is_active(), v.state() == VertexState::Active);
                if v.is_deleted() {
                    prop_assert!(!v.is_active());
                    prop_assert!(!context.contains(v.id()));
                }
            }
        }
    }
}
