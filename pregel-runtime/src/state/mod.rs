pub mod memory_shard_store;
pub mod rocksdb_shard_store;

pub use memory_shard_store::MemoryShardStore;
pub use rocksdb_shard_store::RocksDbShardStore;
