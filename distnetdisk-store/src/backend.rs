//! Adapter traits
//!
//! The orchestrator talks to every external service through these seams,
//! so the network backends and the in-memory doubles are interchangeable.

use bytes::Bytes;
use distnetdisk_core::error::Result;
use distnetdisk_core::record::{FileRecord, ServerRecord};
use std::sync::Arc;

/// Object key for shard `shard_index` of `path`
///
/// Shard identity is stable across stripes: every stripe's shard `j`
/// lands in the same object as part `stripe_index`.
pub fn shard_key(path: &str, shard_index: usize) -> String {
    format!("{path}.{shard_index}")
}

/// Multipart-style blob store on one shard server
#[async_trait::async_trait]
pub trait ShardStore: Send + Sync {
    /// Open an upload session for an object key
    async fn begin_upload(&self, key: &str) -> Result<String>;

    /// Transfer one part into an open session
    ///
    /// Parts for one key must be transferred in increasing part order.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_index: u64,
        data: Bytes,
    ) -> Result<()>;

    /// Commit an upload session, making the object visible
    async fn commit_upload(&self, key: &str, upload_id: &str) -> Result<()>;

    /// Fetch one part of a committed object
    async fn download_part(&self, key: &str, part_index: u64) -> Result<Bytes>;
}

/// Key-value metadata service: server registry and file records
#[async_trait::async_trait]
pub trait MetaStore: Send + Sync {
    /// Current snapshot of the shard-server registry
    async fn list_servers(&self) -> Result<Vec<ServerRecord>>;

    /// Fetch the record for a path, failing with `FileNotFound` if absent
    async fn file_record(&self, path: &str) -> Result<FileRecord>;

    /// Persist the record for a path, overwriting any previous one
    async fn set_file_record(&self, path: &str, record: &FileRecord) -> Result<()>;
}

/// Factory for per-server shard stores
pub trait ShardStoreProvider: Send + Sync {
    /// Connect to the shard store behind a registry entry
    fn connect(&self, server: &ServerRecord) -> Result<Arc<dyn ShardStore>>;
}

#[async_trait::async_trait]
impl<T: MetaStore + ?Sized> MetaStore for Arc<T> {
    async fn list_servers(&self) -> Result<Vec<ServerRecord>> {
        (**self).list_servers().await
    }

    async fn file_record(&self, path: &str) -> Result<FileRecord> {
        (**self).file_record(path).await
    }

    async fn set_file_record(&self, path: &str, record: &FileRecord) -> Result<()> {
        (**self).set_file_record(path, record).await
    }
}

impl<T: ShardStoreProvider + ?Sized> ShardStoreProvider for Arc<T> {
    fn connect(&self, server: &ServerRecord) -> Result<Arc<dyn ShardStore>> {
        (**self).connect(server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_key_convention() {
        assert_eq!(shard_key("docs/report.pdf", 3), "docs/report.pdf.3");
        assert_eq!(shard_key("a", 0), "a.0");
    }
}
