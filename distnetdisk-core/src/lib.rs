//! DistNetDisk Core Library
//!
//! Core abstractions for the DistNetDisk erasure-coded object store client.
//! This crate provides:
//! - Client configuration with validated defaults
//! - Reed-Solomon shard codec (data + parity shards per stripe)
//! - Deterministic stripe slicing with exact padding math
//! - Randomized shard-to-server placement
//! - The persisted metadata model (server registry, file records)

pub mod codec;
pub mod config;
pub mod error;
pub mod placement;
pub mod record;
pub mod slicer;

pub use codec::ShardCodec;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BUCKET, DEFAULT_SHARD_SIZE};
pub use error::{DistNetDiskError, Result};
pub use placement::place_shards;
pub use record::{FileRecord, ServerRecord};
pub use slicer::StripeSlicer;
