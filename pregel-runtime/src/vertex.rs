use crate::edge::Edge;
use pregel_api::registry::VertexRegistry;
use pregel_api::shard::ShardMapping;
use pregel_api::storage::ShardStore;
use pregel_common::config::Configuration;
use pregel_common::error::{PregelError, PregelResult};
use pregel_common::types::{empty_result, RawVertexDocument, ResultDocument, ShardId};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// `inactive_since` value of a vertex whose result has been written out and dropped.
pub const EVICTED: i64 = -1;

/// Consecutive inactive supersteps a vertex keeps its result in memory for.
pub const DEFAULT_EVICTION_THRESHOLD: i64 = 3;

pub const EVICTION_THRESHOLD_KEY: &str = "pregel.vertex.eviction.threshold";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexConfig {
    pub eviction_threshold: i64,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
        }
    }
}

impl VertexConfig {
    pub fn from_configuration(config: &Configuration) -> PregelResult<Self> {
        let eviction_threshold =
            config.get_i64(EVICTION_THRESHOLD_KEY, DEFAULT_EVICTION_THRESHOLD)?;
        if eviction_threshold < 0 {
            return Err(PregelError::InvalidArgument(format!(
                "{EVICTION_THRESHOLD_KEY} must be non-negative, got {eviction_threshold}"
            )));
        }
        Ok(Self { eviction_threshold })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexState {
    Active,
    Inactive,
    /// Inactive, and the result lives only in the result shard.
    InactiveEvicted,
    Deleted,
}

/// One vertex of a running job.
///
/// A vertex is owned by exactly one worker at a time. The only state it shares
/// with other vertices is the parent's active count, reached through the
/// [`VertexRegistry`], and that count is only touched after any storage call
/// made by the same transition has succeeded.
pub struct Vertex {
    id: String,
    key: String,
    shard: ShardId,
    result_shard: ShardId,
    payload: Map<String, Value>,
    active: bool,
    deleted: bool,
    inactive_since: i64,
    result: Value,
    out_edges: Vec<Edge>,
    config: VertexConfig,
    store: Arc<dyn ShardStore>,
    registry: Arc<dyn VertexRegistry>,
}

impl Vertex {
    /// Builds the vertex and eagerly loads its outgoing edges from every edge
    /// shard the mapping assigns to its origin shard.
    ///
    /// Construction only reads from storage. The caller is responsible for
    /// counting the new (active) vertex in its parent.
    pub fn new(
        doc: RawVertexDocument,
        mapping: &dyn ShardMapping,
        store: Arc<dyn ShardStore>,
        registry: Arc<dyn VertexRegistry>,
        config: VertexConfig,
    ) -> PregelResult<Self> {
        let start = Instant::now();
        let RawVertexDocument {
            id,
            key,
            location,
            payload,
        } = doc;
        let shard = location.shard;

        let result_shard = mapping.result_shard_for(&shard).ok_or_else(|| {
            PregelError::Configuration(format!(
                "no result shard for origin shard {shard} (vertex {id})"
            ))
        })?;
        let edge_shards = mapping.edge_shards_for(&shard).ok_or_else(|| {
            PregelError::Configuration(format!(
                "no edge shards for origin shard {shard} (vertex {id})"
            ))
        })?;

        let mut out_edges = Vec::new();
        for edge_shard in edge_shards {
            for raw in store.read_out_edges(&edge_shard, &id)? {
                out_edges.push(Edge::new(raw, edge_shard.clone(), Arc::clone(&store)));
            }
        }

        metrics::counter!("pregel_vertex_constructed_total").increment(1);
        metrics::histogram!("pregel_vertex_construct_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        debug!(vertex = %id, %shard, edges = out_edges.len(), "vertex constructed");

        Ok(Self {
            id,
            key,
            shard,
            result_shard,
            payload,
            active: true,
            deleted: false,
            inactive_since: 0,
            result: empty_result(),
            out_edges,
            config,
            store,
            registry,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn result_shard(&self) -> &str {
        &self.result_shard
    }

    /// Job specific fields of the raw document.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn out_edges(&self) -> &[Edge] {
        &self.out_edges
    }

    pub fn out_edges_mut(&mut self) -> &mut [Edge] {
        &mut self.out_edges
    }

    pub fn is_active(&self) -> bool {
        self.active && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn inactive_since(&self) -> i64 {
        self.inactive_since
    }

    pub fn state(&self) -> VertexState {
        if self.deleted {
            VertexState::Deleted
        } else if self.active {
            VertexState::Active
        } else if self.inactive_since == EVICTED {
            VertexState::InactiveEvicted
        } else {
            VertexState::Inactive
        }
    }

    /// Records one more superstep without a vote to continue. Once the vertex
    /// has sat out `eviction_threshold` supersteps its result is saved along
    /// with its edges and dropped from memory.
    pub fn record_inactive_tick(&mut self) -> PregelResult<()> {
        if self.deleted || self.inactive_since == EVICTED {
            return Ok(());
        }
        if self.inactive_since < self.config.eviction_threshold {
            self.inactive_since += 1;
            return Ok(());
        }

        self.persist(true, false)?;
        self.inactive_since = EVICTED;
        self.result = empty_result();
        metrics::counter!("pregel_vertex_evicted_total").increment(1);
        debug!(vertex = %self.id, "vertex result evicted");
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if self.deleted {
            return;
        }
        if self.is_active() {
            self.registry.decrement_active();
        }
        self.active = false;
    }

    /// Wakes the vertex up, reloading its result first if it was evicted.
    pub fn activate(&mut self) -> PregelResult<()> {
        if self.deleted {
            return Ok(());
        }

        let reloaded = if self.inactive_since == EVICTED {
            let doc = self
                .store
                .read_result_document(&self.result_shard, &self.key)
                .inspect_err(|e| warn!(vertex = %self.id, error = %e, "result reload failed"))?;
            Some(doc.result)
        } else {
            None
        };

        if !self.is_active() {
            self.registry.increment_active();
        }
        self.active = true;
        if let Some(result) = reloaded {
            self.inactive_since = 0;
            self.result = result;
            metrics::counter!("pregel_vertex_reloaded_total").increment(1);
            debug!(vertex = %self.id, "vertex result reloaded");
        }
        Ok(())
    }

    /// Persists the result as deleted and removes the vertex from its parent.
    /// Deleting twice is a no-op.
    pub fn delete(&mut self) -> PregelResult<()> {
        if self.deleted {
            return Ok(());
        }

        self.persist(false, true)?;
        if self.is_active() {
            self.registry.decrement_active();
        }
        self.deleted = true;
        self.registry.forget(&self.id);
        metrics::counter!("pregel_vertex_deleted_total").increment(1);
        debug!(vertex = %self.id, "vertex deleted");
        Ok(())
    }

    /// The in-memory result. Empty while the vertex is evicted.
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = result;
    }

    /// Writes the result document, saving every outgoing edge first when
    /// `force_save_edges` is set.
    pub fn save(&self, force_save_edges: bool) -> PregelResult<()> {
        self.persist(force_save_edges, self.deleted)
    }

    fn persist(&self, force_save_edges: bool, deleted: bool) -> PregelResult<()> {
        let start = Instant::now();
        if force_save_edges {
            for edge in &self.out_edges {
                edge.save()?;
            }
        }

        let doc = ResultDocument {
            key: self.key.clone(),
            deleted,
            result: self.result.clone(),
        };
        self.store
            .write_result_document(&self.result_shard, &doc)
            .inspect_err(|e| warn!(vertex = %self.id, error = %e, "result save failed"))?;

        metrics::counter!("pregel_vertex_saved_total").increment(1);
        metrics::histogram!("pregel_vertex_save_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        Ok(())
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("id", &self.id)
            .field("shard", &self.shard)
            .field("state", &self.state())
            .field("inactive_since", &self.inactive_since)
            .field("out_edges", &self.out_edges.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_threshold_is_read_from_configuration() {
        let mut conf = Configuration::new();
        assert_eq!(
            VertexConfig::from_configuration(&conf).unwrap(),
            VertexConfig::default()
        );

        conf.put(EVICTION_THRESHOLD_KEY, "5");
        assert_eq!(
            VertexConfig::from_configuration(&conf)
                .unwrap()
                .eviction_threshold,
            5
        );

        conf.put(EVICTION_THRESHOLD_KEY, "-2");
        assert!(VertexConfig::from_configuration(&conf).is_err());
    }
}
