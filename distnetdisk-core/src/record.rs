//! Persisted metadata model
//!
//! `ServerRecord` is the registry entry for one shard server; `FileRecord`
//! is the durable metadata written once per successful upload. Both are
//! stored as JSON in the metadata store.

use crate::error::{DistNetDiskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the shard-server registry
///
/// Created and updated by cluster operators; the client only reads the
/// current snapshot at the start of each upload/download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Stable id, derived from the metadata store key (e.g. `server:nyc-1`)
    pub id: String,
    /// Endpoint URL of the server's shard store
    pub url: String,
}

/// Durable metadata for one uploaded file
///
/// Written atomically at the end of a successful upload, overwritten
/// wholesale by a re-upload to the same path, never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Server id per shard slot; position `j` holds shard `j` of every
    /// stripe. Length is `data_shard_num + parity_shard_num`.
    pub shards: Vec<String>,
    /// Upload completion time
    pub modified_at: DateTime<Utc>,
    /// Original file byte length, pre-padding. Sole source of truth for
    /// output length on download.
    pub size: u64,
    /// Zero bytes appended to the final stripe before encoding
    pub padding: u64,
    /// Fault-tolerance budget recorded for this file
    pub parity_shard_num: usize,
    /// Byte length of one shard
    pub shard_size: usize,
}

impl FileRecord {
    /// Number of data shards per stripe
    pub fn data_shard_num(&self) -> usize {
        self.shards.len() - self.parity_shard_num
    }

    /// Total shard slots per stripe
    pub fn total_shards(&self) -> usize {
        self.shards.len()
    }

    /// Byte length of one full stripe of raw file data
    pub fn stripe_bytes(&self) -> u64 {
        self.shard_size as u64 * self.data_shard_num() as u64
    }

    /// Number of stripes that must be fetched to rebuild `size` bytes
    pub fn stripe_count(&self) -> u64 {
        self.size.div_ceil(self.stripe_bytes())
    }

    /// Check the structural invariants of a record read back from the
    /// metadata store before trusting its geometry.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.shards.len() <= self.parity_shard_num || self.shard_size == 0 {
            return Err(DistNetDiskError::Configuration(format!(
                "invalid file record for path = {path}: {} shard slots, parity_shard_num = {}, shard_size = {}",
                self.shards.len(),
                self.parity_shard_num,
                self.shard_size,
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(shards: usize, parity: usize, size: u64, shard_size: usize) -> FileRecord {
        FileRecord {
            shards: (0..shards).map(|i| format!("server:{i}")).collect(),
            modified_at: Utc::now(),
            size,
            padding: 0,
            parity_shard_num: parity,
            shard_size,
        }
    }

    #[test]
    fn test_derived_geometry() {
        let rec = record(6, 2, 5000, 1024);
        assert_eq!(rec.data_shard_num(), 4);
        assert_eq!(rec.total_shards(), 6);
        assert_eq!(rec.stripe_bytes(), 4096);
        assert_eq!(rec.stripe_count(), 2);
    }

    #[test]
    fn test_stripe_count_edges() {
        assert_eq!(record(6, 2, 0, 1024).stripe_count(), 0);
        assert_eq!(record(6, 2, 4096, 1024).stripe_count(), 1);
        assert_eq!(record(6, 2, 4097, 1024).stripe_count(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let rec = record(2, 2, 100, 1024);
        assert!(rec.validate("x").is_err());
        assert!(record(6, 2, 100, 1024).validate("x").is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let rec = record(6, 2, 5000, 1024);
        let json = serde_json::to_string(&rec).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
