//! Redis metadata store
//!
//! Server registry entries live under `server:*` keys, file records under
//! `file:<path>`, both as JSON values. The client only ever reads the
//! registry and reads/overwrites whole file records, so plain string
//! commands are all that is needed.

use crate::backend::MetaStore;
use distnetdisk_core::error::{DistNetDiskError, Result};
use distnetdisk_core::record::{FileRecord, ServerRecord};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::Deserialize;
use tracing::{debug, info, warn};

const SERVER_PREFIX: &str = "server:";
const FILE_PREFIX: &str = "file:";

/// Registry value stored under a `server:*` key
///
/// The server id is the key itself; only the endpoint URL lives in the
/// value. Unknown fields written by operators are ignored.
#[derive(Debug, Deserialize)]
struct ServerInfo {
    url: String,
}

/// Redis-backed metadata store
#[derive(Clone)]
pub struct RedisMetaStore {
    conn: MultiplexedConnection,
}

impl RedisMetaStore {
    /// Connect to the metadata store
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| DistNetDiskError::Transport(format!("redis open failed: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("redis connect failed: {e}")))?;
        info!("Connected to metadata store");
        Ok(Self { conn })
    }

    fn file_key(path: &str) -> String {
        format!("{FILE_PREFIX}{path}")
    }
}

#[async_trait::async_trait]
impl MetaStore for RedisMetaStore {
    async fn list_servers(&self) -> Result<Vec<ServerRecord>> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn
            .keys(format!("{SERVER_PREFIX}*"))
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("redis keys failed: {e}")))?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        // KEYS order is unspecified; sort for a stable snapshot.
        keys.sort();

        let values: Vec<Option<String>> = conn
            .mget(&keys)
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("redis mget failed: {e}")))?;

        let mut servers = Vec::with_capacity(keys.len());
        for (key, value) in keys.into_iter().zip(values) {
            match value {
                Some(json) => {
                    let info: ServerInfo = serde_json::from_str(&json)?;
                    servers.push(ServerRecord {
                        id: key,
                        url: info.url,
                    });
                }
                // Key vanished between KEYS and MGET.
                None => warn!(key = %key, "server registry entry disappeared, skipping"),
            }
        }
        debug!(count = servers.len(), "Listed shard servers");
        Ok(servers)
    }

    async fn file_record(&self, path: &str) -> Result<FileRecord> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .get(Self::file_key(path))
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("redis get failed: {e}")))?;
        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(DistNetDiskError::FileNotFound(path.to_string())),
        }
    }

    async fn set_file_record(&self, path: &str, record: &FileRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::file_key(path), json)
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("redis set failed: {e}")))?;
        debug!(path = %path, shards = record.shards.len(), "File record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_prefix() {
        assert_eq!(RedisMetaStore::file_key("a/b.txt"), "file:a/b.txt");
    }

    #[test]
    fn test_server_info_ignores_extra_fields() {
        let info: ServerInfo =
            serde_json::from_str(r#"{"name":"nyc-1","url":"http://10.0.0.1:9000"}"#).unwrap();
        assert_eq!(info.url, "http://10.0.0.1:9000");
    }
}
