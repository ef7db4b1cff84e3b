//! Error types for DistNetDisk
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias for DistNetDisk operations
pub type Result<T> = std::result::Result<T, DistNetDiskError>;

/// Unified error type for DistNetDisk
#[derive(Error, Debug)]
pub enum DistNetDiskError {
    // ===== Placement Errors =====
    #[error("Servers not enough: have {servers}, data_shard_num = {data_shard_num}, parity_shard_num = {parity_shard_num}")]
    InsufficientServers {
        servers: usize,
        data_shard_num: usize,
        parity_shard_num: usize,
    },

    // ===== Metadata Errors =====
    #[error("File not exists: path = {0}")]
    FileNotFound(String),

    // ===== Download Errors =====
    #[error("File corrupt: path = {path}, only allow {allowed} lost but {lost} lost actually")]
    Corrupt {
        path: String,
        lost: usize,
        allowed: usize,
    },

    // ===== Erasure Coding Errors =====
    #[error("Erasure coding error: {0}")]
    ErasureCoding(String),

    #[error("Insufficient shards: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("Shard count mismatch: expected {expected}, got {actual}")]
    ShardCountMismatch { expected: usize, actual: usize },

    #[error("Shard size mismatch: expected {expected}, got {actual}")]
    ShardSizeMismatch { expected: usize, actual: usize },

    // ===== Transport Errors =====
    #[error("Transport error: {0}")]
    Transport(String),

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Serialization Errors =====
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reed_solomon_erasure::Error> for DistNetDiskError {
    fn from(err: reed_solomon_erasure::Error) -> Self {
        DistNetDiskError::ErasureCoding(err.to_string())
    }
}
