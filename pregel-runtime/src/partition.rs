use crate::vertex::{Vertex, VertexConfig, VertexState};
use dashmap::DashSet;
use pregel_api::registry::VertexRegistry;
use pregel_api::shard::ShardMapping;
use pregel_api::storage::ShardStore;
use pregel_common::error::{PregelError, PregelResult};
use pregel_common::types::RawVertexDocument;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Parent of the vertices resident in one partition.
#[derive(Debug, Default)]
pub struct PartitionContext {
    active: AtomicUsize,
    members: DashSet<String>,
}

impl PartitionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly constructed vertex, which starts out active.
    /// Returns false if the id was already registered.
    pub fn register(&self, vertex_id: &str) -> bool {
        if !self.members.insert(vertex_id.to_string()) {
            return false;
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn contains(&self, vertex_id: &str) -> bool {
        self.members.contains(vertex_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl VertexRegistry for PartitionContext {
    fn increment_active(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement_active(&self) {
        if self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            warn!("active vertex count decremented below zero");
        }
    }

    fn forget(&self, vertex_id: &str) {
        self.members.remove(vertex_id);
    }
}

/// What a vertex asks for at the end of its compute step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Continue,
    Halt,
    Delete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperstepStats {
    pub superstep: u64,
    pub computed: usize,
    pub halted: usize,
    pub deleted: usize,
    pub evicted: usize,
    pub active: usize,
}

enum Outcome {
    Computed,
    Halted,
    Deleted,
    Idle,
    Evicted,
}

/// The vertices of one partition and the loop that drives them through
/// supersteps. Each vertex is handed to exactly one rayon worker per superstep.
pub struct Partition {
    context: Arc<PartitionContext>,
    vertices: HashMap<String, Vertex>,
    superstep: u64,
}

impl Partition {
    pub fn load(
        docs: Vec<RawVertexDocument>,
        mapping: &dyn ShardMapping,
        store: Arc<dyn ShardStore>,
        config: VertexConfig,
    ) -> PregelResult<Self> {
        let context = Arc::new(PartitionContext::new());
        let registry: Arc<dyn VertexRegistry> = context.clone();

        let built = docs
            .into_par_iter()
            .map(|doc| {
                Vertex::new(
                    doc,
                    mapping,
                    Arc::clone(&store),
                    Arc::clone(&registry),
                    config,
                )
            })
            .collect::<PregelResult<Vec<Vertex>>>()?;

        let mut vertices = HashMap::with_capacity(built.len());
        for vertex in built {
            if !context.register(vertex.id()) {
                return Err(PregelError::InvalidArgument(format!(
                    "duplicate vertex id in partition: {}",
                    vertex.id()
                )));
            }
            vertices.insert(vertex.id().to_string(), vertex);
        }
        debug!(vertices = vertices.len(), "partition loaded");

        Ok(Self {
            context,
            vertices,
            superstep: 0,
        })
    }

    /// Runs one superstep. Active vertices compute and vote; vertices that
    /// were already inactive record an inactive tick. Deleted vertices leave
    /// the partition. The first vertex error, if any, is returned after every
    /// vertex has been processed.
    pub fn superstep<F>(&mut self, compute: F) -> PregelResult<SuperstepStats>
    where
        F: Fn(u64, &mut Vertex) -> PregelResult<Vote> + Sync,
    {
        let start = Instant::now();
        self.superstep += 1;
        let superstep = self.superstep;

        let outcomes: Vec<PregelResult<Outcome>> = self
            .vertices
            .par_iter_mut()
            .map(|(_, vertex)| step_vertex(superstep, vertex, &compute))
            .collect();

        let mut stats = SuperstepStats {
            superstep,
            ..SuperstepStats::default()
        };
        let mut first_err = None;
        for outcome in outcomes {
            match outcome {
                Ok(Outcome::Computed) => stats.computed += 1,
                Ok(Outcome::Halted) => {
                    stats.computed += 1;
                    stats.halted += 1;
                }
                Ok(Outcome::Deleted) => {
                    stats.computed += 1;
                    stats.deleted += 1;
                }
                Ok(Outcome::Evicted) => stats.evicted += 1,
                Ok(Outcome::Idle) => {}
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        self.vertices.retain(|_, v| !v.is_deleted());
        stats.active = self.context.active_count();

        metrics::histogram!("pregel_partition_superstep_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        metrics::gauge!("pregel_partition_active_vertices").set(stats.active as f64);
        debug!(
            superstep,
            computed = stats.computed,
            halted = stats.halted,
            deleted = stats.deleted,
            evicted = stats.evicted,
            active = stats.active,
            "superstep finished"
        );

        match first_err {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Wakes a resident vertex, e.g. because a message arrived for it.
    /// Returns false if no such vertex lives in this partition.
    pub fn activate(&mut self, vertex_id: &str) -> PregelResult<bool> {
        match self.vertices.get_mut(vertex_id) {
            Some(vertex) => {
                vertex.activate()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn vertex(&self, vertex_id: &str) -> Option<&Vertex> {
        self.vertices.get(vertex_id)
    }

    pub fn vertex_mut(&mut self, vertex_id: &str) -> Option<&mut Vertex> {
        self.vertices.get_mut(vertex_id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn context(&self) -> &Arc<PartitionContext> {
        &self.context
    }

    pub fn active_count(&self) -> usize {
        self.context.active_count()
    }

    /// True once no vertex is left to compute.
    pub fn is_halted(&self) -> bool {
        self.context.active_count() == 0
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn current_superstep(&self) -> u64 {
        self.superstep
    }
}

fn step_vertex<F>(superstep: u64, vertex: &mut Vertex, compute: &F) -> PregelResult<Outcome>
where
    F: Fn(u64, &mut Vertex) -> PregelResult<Vote>,
{
    if vertex.is_deleted() {
        return Ok(Outcome::Idle);
    }

    if !vertex.is_active() {
        let was_evicted = vertex.state() == VertexState::InactiveEvicted;
        vertex.record_inactive_tick()?;
        let evicted_now = !was_evicted && vertex.state() == VertexState::InactiveEvicted;
        return Ok(if evicted_now {
            Outcome::Evicted
        } else {
            Outcome::Idle
        });
    }

    match compute(superstep, vertex)? {
        Vote::Continue => Ok(Outcome::Computed),
        Vote::Halt => {
            vertex.deactivate();
            Ok(Outcome::Halted)
        }
        Vote::Delete => {
            vertex.delete()?;
            Ok(Outcome::Deleted)
        }
    }
}
