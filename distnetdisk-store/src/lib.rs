//! DistNetDisk storage adapters
//!
//! Trait seams for the two external services the client consumes (the
//! per-server shard store and the metadata store), plus the concrete
//! backends: Redis metadata, HTTP multipart shard store, and in-memory
//! doubles for tests and development.

pub mod backend;
pub mod memory;
pub mod meta;
pub mod s3;

pub use backend::{shard_key, MetaStore, ShardStore, ShardStoreProvider};
pub use memory::{MemoryMetaStore, MemoryShardStore, MemoryShardStoreProvider};
pub use meta::RedisMetaStore;
pub use s3::{HttpShardStore, HttpShardStoreProvider};
