//! In-memory backends
//!
//! Used for testing and development. Not persistent. The shard store
//! keeps full multipart semantics (sessions are invisible until commit)
//! and carries op counters plus a failure-injection toggle so tests can
//! assert protocol sequencing and degraded-download behavior.

use crate::backend::{MetaStore, ShardStore, ShardStoreProvider};
use bytes::Bytes;
use distnetdisk_core::error::{DistNetDiskError, Result};
use distnetdisk_core::record::{FileRecord, ServerRecord};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory multipart shard store
#[derive(Default)]
pub struct MemoryShardStore {
    /// Open sessions, keyed by (object key, upload id)
    sessions: RwLock<HashMap<(String, String), BTreeMap<u64, Bytes>>>,
    /// Committed objects: parts by part index
    objects: RwLock<HashMap<String, BTreeMap<u64, Bytes>>>,
    failing: AtomicBool,

    /// Operation counters
    begins: AtomicU64,
    parts: AtomicU64,
    commits: AtomicU64,
    downloads: AtomicU64,
}

impl MemoryShardStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of committed objects
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// Number of sessions still open (uncommitted)
    pub fn open_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Total operations of any kind issued against this store
    pub fn total_ops(&self) -> u64 {
        self.begins.load(Ordering::Relaxed)
            + self.parts.load(Ordering::Relaxed)
            + self.commits.load(Ordering::Relaxed)
            + self.downloads.load(Ordering::Relaxed)
    }

    fn guard(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DistNetDiskError::Transport(
                "injected shard store failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ShardStore for MemoryShardStore {
    async fn begin_upload(&self, key: &str) -> Result<String> {
        self.begins.fetch_add(1, Ordering::Relaxed);
        self.guard()?;
        let upload_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .insert((key.to_string(), upload_id.clone()), BTreeMap::new());
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_index: u64,
        data: Bytes,
    ) -> Result<()> {
        self.parts.fetch_add(1, Ordering::Relaxed);
        self.guard()?;
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&(key.to_string(), upload_id.to_string()))
            .ok_or_else(|| {
                DistNetDiskError::Transport(format!("unknown upload session: key = {key}"))
            })?;
        session.insert(part_index, data);
        Ok(())
    }

    async fn commit_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.guard()?;
        let parts = self
            .sessions
            .write()
            .remove(&(key.to_string(), upload_id.to_string()))
            .ok_or_else(|| {
                DistNetDiskError::Transport(format!("unknown upload session: key = {key}"))
            })?;
        self.objects.write().insert(key.to_string(), parts);
        Ok(())
    }

    async fn download_part(&self, key: &str, part_index: u64) -> Result<Bytes> {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.guard()?;
        let objects = self.objects.read();
        objects
            .get(key)
            .and_then(|parts| parts.get(&part_index))
            .cloned()
            .ok_or_else(|| {
                DistNetDiskError::Transport(format!(
                    "part not found: key = {key}, part = {part_index}"
                ))
            })
    }
}

/// In-memory metadata store
#[derive(Default)]
pub struct MemoryMetaStore {
    servers: RwLock<Vec<ServerRecord>>,
    files: RwLock<HashMap<String, FileRecord>>,
}

impl MemoryMetaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a server to the registry
    pub fn add_server(&self, id: &str, url: &str) {
        self.servers.write().push(ServerRecord {
            id: id.to_string(),
            url: url.to_string(),
        });
    }

    /// Drop a server from the registry, simulating operator removal
    pub fn remove_server(&self, id: &str) {
        self.servers.write().retain(|s| s.id != id);
    }
}

#[async_trait::async_trait]
impl MetaStore for MemoryMetaStore {
    async fn list_servers(&self) -> Result<Vec<ServerRecord>> {
        Ok(self.servers.read().clone())
    }

    async fn file_record(&self, path: &str) -> Result<FileRecord> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| DistNetDiskError::FileNotFound(path.to_string()))
    }

    async fn set_file_record(&self, path: &str, record: &FileRecord) -> Result<()> {
        self.files.write().insert(path.to_string(), record.clone());
        Ok(())
    }
}

/// Provider resolving registry URLs to shared in-memory shard stores
#[derive(Default)]
pub struct MemoryShardStoreProvider {
    stores: RwLock<HashMap<String, Arc<MemoryShardStore>>>,
}

impl MemoryShardStoreProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shard store under a URL and return a handle to it
    pub fn register(&self, url: &str) -> Arc<MemoryShardStore> {
        let store = Arc::new(MemoryShardStore::new());
        self.stores.write().insert(url.to_string(), store.clone());
        store
    }
}

impl ShardStoreProvider for MemoryShardStoreProvider {
    fn connect(&self, server: &ServerRecord) -> Result<Arc<dyn ShardStore>> {
        self.stores
            .read()
            .get(&server.url)
            .cloned()
            .map(|store| store as Arc<dyn ShardStore>)
            .ok_or_else(|| {
                DistNetDiskError::Transport(format!("unknown server url: {}", server.url))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_multipart_lifecycle() {
        let store = MemoryShardStore::new();
        let upload_id = store.begin_upload("f.0").await.unwrap();

        store
            .upload_part("f.0", &upload_id, 0, Bytes::from_static(b"aa"))
            .await
            .unwrap();
        store
            .upload_part("f.0", &upload_id, 1, Bytes::from_static(b"bb"))
            .await
            .unwrap();

        // Parts are invisible until commit.
        assert!(store.download_part("f.0", 0).await.is_err());
        assert_eq!(store.open_sessions(), 1);

        store.commit_upload("f.0", &upload_id).await.unwrap();
        assert_eq!(store.open_sessions(), 0);
        assert_eq!(store.object_count(), 1);
        assert_eq!(store.download_part("f.0", 1).await.unwrap().as_ref(), b"bb");
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let store = MemoryShardStore::new();
        let result = store
            .upload_part("f.0", "bogus", 0, Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(DistNetDiskError::Transport(_))));
        assert!(store.commit_upload("f.0", "bogus").await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryShardStore::new();
        let upload_id = store.begin_upload("f.0").await.unwrap();
        store
            .upload_part("f.0", &upload_id, 0, Bytes::from_static(b"x"))
            .await
            .unwrap();
        store.commit_upload("f.0", &upload_id).await.unwrap();

        store.set_failing(true);
        assert!(store.download_part("f.0", 0).await.is_err());
        store.set_failing(false);
        assert!(store.download_part("f.0", 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_meta_store_records() {
        let meta = MemoryMetaStore::new();
        assert!(matches!(
            meta.file_record("missing").await,
            Err(DistNetDiskError::FileNotFound(_))
        ));

        meta.add_server("server:a", "mem://a");
        meta.add_server("server:b", "mem://b");
        assert_eq!(meta.list_servers().await.unwrap().len(), 2);

        meta.remove_server("server:a");
        let servers = meta.list_servers().await.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].id, "server:b");
    }

    #[tokio::test]
    async fn test_provider_resolves_registered_urls() {
        let provider = MemoryShardStoreProvider::new();
        provider.register("mem://a");

        let known = ServerRecord {
            id: "server:a".to_string(),
            url: "mem://a".to_string(),
        };
        assert!(provider.connect(&known).is_ok());

        let unknown = ServerRecord {
            id: "server:z".to_string(),
            url: "mem://z".to_string(),
        };
        assert!(provider.connect(&unknown).is_err());
    }
}
