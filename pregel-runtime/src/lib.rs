pub mod edge;
pub mod mapping;
pub mod observability;
pub mod partition;
pub mod state;
pub mod vertex;
