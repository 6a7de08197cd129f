pub mod registry;
pub mod shard;
pub mod storage;
