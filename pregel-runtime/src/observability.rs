use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Registers help text for the vertex and partition metrics with whatever
/// recorder the embedding process installed.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "pregel_vertex_constructed_total",
        "Vertices built from raw documents"
    );
    metrics::describe_histogram!(
        "pregel_vertex_construct_duration_ms",
        metrics::Unit::Milliseconds,
        "Time to build one vertex including its edge scan"
    );
    metrics::describe_counter!(
        "pregel_vertex_saved_total",
        "Result documents written"
    );
    metrics::describe_histogram!(
        "pregel_vertex_save_duration_ms",
        metrics::Unit::Milliseconds,
        "Time to write one result document, edges included"
    );
    metrics::describe_counter!(
        "pregel_vertex_evicted_total",
        "Results dropped from memory after a long inactive run"
    );
    metrics::describe_counter!(
        "pregel_vertex_reloaded_total",
        "Evicted results read back on reactivation"
    );
    metrics::describe_counter!("pregel_vertex_deleted_total", "Vertices deleted");
    metrics::describe_histogram!(
        "pregel_partition_superstep_duration_ms",
        metrics::Unit::Milliseconds,
        "Wall time of one partition superstep"
    );
    metrics::describe_gauge!(
        "pregel_partition_active_vertices",
        "Active vertices after the last superstep"
    );
}
