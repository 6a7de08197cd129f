/// The parent of a set of vertices: owns the active-vertex count and the
/// membership registry. Implementations must be safe to call from several
/// workers at once.
pub trait VertexRegistry: Send + Sync {
    fn increment_active(&self);
    fn decrement_active(&self);
    fn forget(&self, vertex_id: &str);
}
