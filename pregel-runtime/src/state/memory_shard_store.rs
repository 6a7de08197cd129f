use dashmap::DashMap;
use pregel_api::storage::ShardStore;
use pregel_common::error::{PregelError, PregelResult};
use pregel_common::types::{RawEdgeDocument, ResultDocument, ShardId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shard store kept entirely in process memory.
///
/// Edges keep insertion order within a shard. The store can be switched into
/// an unavailable mode in which every call fails, for exercising error paths.
#[derive(Debug, Default)]
pub struct MemoryShardStore {
    edges: DashMap<ShardId, Vec<RawEdgeDocument>>,
    results: DashMap<ShardId, HashMap<String, ResultDocument>>,
    result_writes: AtomicUsize,
    edge_writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryShardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_edge(&self, edge_shard: &str, doc: RawEdgeDocument) {
        self.edges
            .entry(edge_shard.to_string())
            .or_default()
            .push(doc);
    }

    pub fn insert_result(&self, result_shard: &str, doc: ResultDocument) {
        self.results
            .entry(result_shard.to_string())
            .or_default()
            .insert(doc.key.clone(), doc);
    }

    pub fn result_document(&self, result_shard: &str, key: &str) -> Option<ResultDocument> {
        self.results
            .get(result_shard)
            .and_then(|docs| docs.get(key).cloned())
    }

    pub fn edge_document(&self, edge_shard: &str, key: &str) -> Option<RawEdgeDocument> {
        self.edges
            .get(edge_shard)
            .and_then(|docs| docs.iter().find(|d| d.key == key).cloned())
    }

    pub fn result_writes(&self) -> usize {
        self.result_writes.load(Ordering::SeqCst)
    }

    pub fn edge_writes(&self) -> usize {
        self.edge_writes.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, op: &str) -> PregelResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PregelError::StorageUnavailable(format!(
                "memory store offline during {op}"
            )));
        }
        Ok(())
    }
}

impl ShardStore for MemoryShardStore {
    fn read_out_edges(
        &self,
        edge_shard: &str,
        vertex_id: &str,
    ) -> PregelResult<Vec<RawEdgeDocument>> {
        self.check_available("read_out_edges")?;
        Ok(self
            .edges
            .get(edge_shard)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.from == vertex_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn read_result_document(&self, result_shard: &str, key: &str) -> PregelResult<ResultDocument> {
        self.check_available("read_result_document")?;
        self.result_document(result_shard, key)
            .ok_or_else(|| PregelError::DocumentNotFound {
                shard: result_shard.to_string(),
                key: key.to_string(),
            })
    }

    fn write_result_document(&self, result_shard: &str, doc: &ResultDocument) -> PregelResult<()> {
        self.check_available("write_result_document")?;
        self.insert_result(result_shard, doc.clone());
        self.result_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_edge_document(&self, edge_shard: &str, doc: &RawEdgeDocument) -> PregelResult<()> {
        self.check_available("write_edge_document")?;
        let mut docs = self.edges.entry(edge_shard.to_string()).or_default();
        match docs.iter_mut().find(|d| d.key == doc.key) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        self.edge_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn out_edges_are_filtered_by_source_in_insertion_order() {
        let store = MemoryShardStore::new();
        store.insert_edge("e1", RawEdgeDocument::new("edges/b", "b", "v/1", "v/3"));
        store.insert_edge("e1", RawEdgeDocument::new("edges/x", "x", "v/2", "v/1"));
        store.insert_edge("e1", RawEdgeDocument::new("edges/a", "a", "v/1", "v/2"));

        let out = store.read_out_edges("e1", "v/1").unwrap();
        let keys: Vec<_> = out.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(store.read_out_edges("e2", "v/1").unwrap().is_empty());
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = MemoryShardStore::new();
        store.set_unavailable(true);
        let doc = ResultDocument {
            key: "1".to_string(),
            deleted: false,
            result: json!({}),
        };
        assert!(matches!(
            store.write_result_document("r1", &doc),
            Err(PregelError::StorageUnavailable(_))
        ));
        assert_eq!(store.result_writes(), 0);

        store.set_unavailable(false);
        store.write_result_document("r1", &doc).unwrap();
        assert_eq!(store.read_result_document("r1", "1").unwrap(), doc);
        assert!(matches!(
            store.read_result_document("r1", "2"),
            Err(PregelError::DocumentNotFound { .. })
        ));
    }
}
