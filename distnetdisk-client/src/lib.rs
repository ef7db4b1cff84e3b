//! DistNetDisk client
//!
//! The orchestrator for the erasure-coded object store: slices files into
//! stripes, encodes each stripe into data + parity shards, scatters the
//! shards across a placement of shard servers via the multipart protocol,
//! and reconstructs files from any surviving subset within the parity
//! budget.

pub mod client;

pub use client::Client;
