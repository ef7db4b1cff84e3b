//! Client configuration
//!
//! Defaults are filled by the builder before validation, so a constructed
//! `ClientConfig` is always fully populated and internally consistent.

use crate::error::{DistNetDiskError, Result};
use serde::{Deserialize, Serialize};

/// Default shard size: 16 MiB per shard, per stripe, per server
pub const DEFAULT_SHARD_SIZE: usize = 16 * 1024 * 1024;

/// Default bucket namespace on every shard server
pub const DEFAULT_BUCKET: &str = "distnetdisk";

/// Validated, immutable client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Number of data shards per stripe (k)
    pub data_shard_num: usize,
    /// Number of parity shards per stripe (m); the fault-tolerance budget
    pub parity_shard_num: usize,
    /// Byte length of one shard
    pub shard_size: usize,
    /// Bucket namespace used on every shard server
    pub bucket: String,
}

impl ClientConfig {
    /// Create a config with default shard size and bucket
    pub fn new(data_shard_num: usize, parity_shard_num: usize) -> Result<Self> {
        Self::builder(data_shard_num, parity_shard_num).build()
    }

    /// Start building a config
    pub fn builder(data_shard_num: usize, parity_shard_num: usize) -> ClientConfigBuilder {
        ClientConfigBuilder {
            data_shard_num,
            parity_shard_num,
            shard_size: None,
            bucket: None,
        }
    }

    /// Total number of shard slots per stripe (data + parity)
    pub fn total_shards(&self) -> usize {
        self.data_shard_num + self.parity_shard_num
    }

    /// Byte length of one full stripe of raw file data
    pub fn stripe_bytes(&self) -> usize {
        self.shard_size * self.data_shard_num
    }

    /// Maximum number of shard slots that may be lost per file
    pub fn max_failures(&self) -> usize {
        self.parity_shard_num
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    data_shard_num: usize,
    parity_shard_num: usize,
    shard_size: Option<usize>,
    bucket: Option<String>,
}

impl ClientConfigBuilder {
    /// Override the shard size
    pub fn shard_size(mut self, shard_size: usize) -> Self {
        self.shard_size = Some(shard_size);
        self
    }

    /// Override the bucket namespace
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Fill defaults, validate, and return the immutable config
    pub fn build(self) -> Result<ClientConfig> {
        let config = ClientConfig {
            data_shard_num: self.data_shard_num,
            parity_shard_num: self.parity_shard_num,
            shard_size: self.shard_size.unwrap_or(DEFAULT_SHARD_SIZE),
            bucket: self.bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        };

        if config.data_shard_num == 0 {
            return Err(DistNetDiskError::Configuration(
                "data_shard_num must be > 0".to_string(),
            ));
        }
        if config.shard_size == 0 {
            return Err(DistNetDiskError::Configuration(
                "shard_size must be > 0".to_string(),
            ));
        }
        if config.bucket.is_empty() {
            return Err(DistNetDiskError::Configuration(
                "bucket must not be empty".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(4, 2).unwrap();
        assert_eq!(config.shard_size, DEFAULT_SHARD_SIZE);
        assert_eq!(config.bucket, "distnetdisk");
        assert_eq!(config.total_shards(), 6);
        assert_eq!(config.stripe_bytes(), 4 * DEFAULT_SHARD_SIZE);
        assert_eq!(config.max_failures(), 2);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder(3, 1)
            .shard_size(1024)
            .bucket("testdisk")
            .build()
            .unwrap();
        assert_eq!(config.shard_size, 1024);
        assert_eq!(config.bucket, "testdisk");
        assert_eq!(config.stripe_bytes(), 3072);
    }

    #[test]
    fn test_zero_parity_allowed() {
        let config = ClientConfig::new(4, 0).unwrap();
        assert_eq!(config.total_shards(), 4);
        assert_eq!(config.max_failures(), 0);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(ClientConfig::new(0, 2).is_err());
        assert!(ClientConfig::builder(4, 2).shard_size(0).build().is_err());
        assert!(ClientConfig::builder(4, 2).bucket("").build().is_err());
    }
}
