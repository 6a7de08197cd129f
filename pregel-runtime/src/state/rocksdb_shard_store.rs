use pregel_api::storage::ShardStore;
use pregel_common::error::{PregelError, PregelResult};
use pregel_common::types::{RawEdgeDocument, ResultDocument};
use rocksdb::checkpoint::Checkpoint;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

const CF_EDGES: &str = "edges";
const CF_RESULTS: &str = "results";
const SEP: u8 = 0;

/// Durable shard store. All shards share one database; keys are prefixed with
/// the shard name so that one vertex's edges in one shard form a contiguous
/// key range.
#[derive(Clone)]
pub struct RocksDbShardStore {
    db: Arc<DB>,
}

impl RocksDbShardStore {
    pub fn open(path: impl AsRef<Path>) -> PregelResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_EDGES, Options::default()),
            ColumnFamilyDescriptor::new(CF_RESULTS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| PregelError::StorageUnavailable(format!("rocksdb open failed: {e}")))?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn create_checkpoint(&self, checkpoint_dir: impl AsRef<Path>) -> PregelResult<()> {
        let cp = Checkpoint::new(&self.db)
            .map_err(|e| PregelError::Internal(format!("rocksdb checkpoint init: {e}")))?;
        cp.create_checkpoint(checkpoint_dir)
            .map_err(|e| PregelError::Internal(format!("rocksdb create checkpoint: {e}")))?;
        Ok(())
    }

    /// Bulk loads edge documents into one shard.
    pub fn put_edge_batch(&self, edge_shard: &str, edges: &[RawEdgeDocument]) -> PregelResult<()> {
        let cf = self.cf(CF_EDGES)?;
        let mut batch = WriteBatch::default();
        for e in edges {
            batch.put_cf(cf, edge_key(edge_shard, &e.from, &e.key), encode(e)?);
        }
        self.db.write(batch).map_err(|e| {
            PregelError::StorageUnavailable(format!("rocksdb write batch (edges): {e}"))
        })
    }

    fn cf(&self, name: &str) -> PregelResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PregelError::Internal(format!("missing column family: {name}")))
    }
}

fn prefix(parts: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for p in parts {
        out.extend_from_slice(p.as_bytes());
        out.push(SEP);
    }
    out
}

fn edge_key(shard: &str, from: &str, key: &str) -> Vec<u8> {
    let mut out = prefix(&[shard, from]);
    out.extend_from_slice(key.as_bytes());
    out
}

fn result_key(shard: &str, key: &str) -> Vec<u8> {
    let mut out = prefix(&[shard]);
    out.extend_from_slice(key.as_bytes());
    out
}

fn encode<T: serde::Serialize>(v: &T) -> PregelResult<Vec<u8>> {
    serde_json::to_vec(v).map_err(|e| PregelError::Internal(format!("json encode: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> PregelResult<T> {
    serde_json::from_slice(bytes).map_err(|e| PregelError::Internal(format!("json decode: {e}")))
}

impl ShardStore for RocksDbShardStore {
    fn read_out_edges(
        &self,
        edge_shard: &str,
        vertex_id: &str,
    ) -> PregelResult<Vec<RawEdgeDocument>> {
        let cf = self.cf(CF_EDGES)?;
        let start = prefix(&[edge_shard, vertex_id]);
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(start.as_slice(), Direction::Forward));
        for kv in iter {
            let (k, v) =
                kv.map_err(|e| PregelError::StorageUnavailable(format!("rocksdb iter: {e}")))?;
            if !k.starts_with(&start) {
                break;
            }
            out.push(decode(&v)?);
        }
        Ok(out)
    }

    fn read_result_document(&self, result_shard: &str, key: &str) -> PregelResult<ResultDocument> {
        let cf = self.cf(CF_RESULTS)?;
        let v = self
            .db
            .get_cf(cf, result_key(result_shard, key))
            .map_err(|e| PregelError::StorageUnavailable(format!("rocksdb get result: {e}")))?;
        match v {
            None => Err(PregelError::DocumentNotFound {
                shard: result_shard.to_string(),
                key: key.to_string(),
            }),
            Some(bytes) => decode(&bytes),
        }
    }

    fn write_result_document(&self, result_shard: &str, doc: &ResultDocument) -> PregelResult<()> {
        let cf = self.cf(CF_RESULTS)?;
        self.db
            .put_cf(cf, result_key(result_shard, &doc.key), encode(doc)?)
            .map_err(|e| PregelError::StorageUnavailable(format!("rocksdb put result: {e}")))
    }

    fn write_edge_document(&self, edge_shard: &str, doc: &RawEdgeDocument) -> PregelResult<()> {
        let cf = self.cf(CF_EDGES)?;
        self.db
            .put_cf(cf, edge_key(edge_shard, &doc.from, &doc.key), encode(doc)?)
            .map_err(|e| PregelError::StorageUnavailable(format!("rocksdb put edge: {e}")))
    }
}
