//! Upload/download orchestration
//!
//! Protocol sequencing per file:
//! - upload: registry snapshot -> placement -> open K sessions -> per
//!   stripe encode + one part per session -> commit all -> write record
//! - download: registry snapshot + record -> resolve shard servers ->
//!   parity budget check -> per stripe fetch + reconstruct -> trim to size
//!
//! The file record is written only after every session commits, so a file
//! is either fully present with a consistent record or absent from the
//! metadata store; orphaned shard objects from failed uploads are left
//! for external garbage collection.

use bytes::Bytes;
use chrono::Utc;
use distnetdisk_core::codec::ShardCodec;
use distnetdisk_core::config::ClientConfig;
use distnetdisk_core::error::{DistNetDiskError, Result};
use distnetdisk_core::placement::place_shards;
use distnetdisk_core::record::{FileRecord, ServerRecord};
use distnetdisk_core::slicer::StripeSlicer;
use distnetdisk_store::backend::{shard_key, MetaStore, ShardStore, ShardStoreProvider};
use distnetdisk_store::meta::RedisMetaStore;
use distnetdisk_store::s3::HttpShardStoreProvider;
use futures::future::{join_all, try_join_all};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, info, instrument, warn};

/// Erasure-coded object store client
///
/// Generic over the metadata store and the shard-store provider so the
/// network backends and in-memory doubles are interchangeable.
pub struct Client<M, P> {
    config: ClientConfig,
    codec: ShardCodec,
    meta: M,
    provider: P,
}

impl Client<RedisMetaStore, HttpShardStoreProvider> {
    /// Connect a client against the Redis metadata store and HTTP shard
    /// servers.
    pub async fn open(config: ClientConfig, redis_url: &str) -> Result<Self> {
        let meta = RedisMetaStore::connect(redis_url).await?;
        let provider = HttpShardStoreProvider::new(&config.bucket)?;
        Self::new(config, meta, provider)
    }
}

impl<M: MetaStore, P: ShardStoreProvider> Client<M, P> {
    /// Create a client over arbitrary backends
    pub fn new(config: ClientConfig, meta: M, provider: P) -> Result<Self> {
        let codec = ShardCodec::new(config.data_shard_num, config.parity_shard_num)?;
        Ok(Self {
            config,
            codec,
            meta,
            provider,
        })
    }

    /// The validated configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload `size` bytes from `reader` under `path`
    ///
    /// Any session-open, part-transfer, commit, or metadata failure
    /// aborts the whole upload without writing a file record.
    #[instrument(skip(self, reader))]
    pub async fn upload<R: AsyncRead + Unpin>(
        &self,
        path: &str,
        reader: R,
        size: u64,
    ) -> Result<()> {
        let servers = self.meta.list_servers().await?;
        let mut rng = StdRng::from_entropy();
        let placement = place_shards(
            &mut rng,
            servers.len(),
            self.config.data_shard_num,
            self.config.parity_shard_num,
        )?;
        let shard_servers: Vec<&ServerRecord> = placement.iter().map(|&i| &servers[i]).collect();
        debug!(
            path = %path,
            placement = ?shard_servers.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            "Placement computed"
        );

        let stores: Vec<Arc<dyn ShardStore>> = shard_servers
            .iter()
            .map(|server| self.provider.connect(server))
            .collect::<Result<_>>()?;
        let keys: Vec<String> = (0..stores.len()).map(|j| shard_key(path, j)).collect();

        // One session per shard slot; sessions across slots are
        // independent, so open them all at once.
        let upload_ids = try_join_all(
            stores
                .iter()
                .zip(&keys)
                .map(|(store, key)| store.begin_upload(key)),
        )
        .await?;

        let mut slicer = StripeSlicer::new(
            reader,
            size,
            self.config.shard_size,
            self.config.data_shard_num,
        );
        let mut stripe_index: u64 = 0;
        while let Some(data_shards) = slicer.next_stripe().await? {
            let encoded = self.codec.encode(data_shards)?;
            // Stripe index is the part number. One stripe in flight keeps
            // per-slot parts ordered and bounds buffered memory to
            // total_shards * shard_size bytes.
            try_join_all(encoded.into_iter().enumerate().map(|(j, shard)| {
                let store = &stores[j];
                let key = &keys[j];
                let upload_id = &upload_ids[j];
                async move {
                    store
                        .upload_part(key, upload_id, stripe_index, Bytes::from(shard))
                        .await
                }
            }))
            .await?;
            debug!(path = %path, stripe = stripe_index, "Stripe transferred");
            stripe_index += 1;
        }

        try_join_all(
            stores
                .iter()
                .zip(&keys)
                .zip(&upload_ids)
                .map(|((store, key), upload_id)| store.commit_upload(key, upload_id)),
        )
        .await?;

        let record = FileRecord {
            shards: shard_servers.iter().map(|s| s.id.clone()).collect(),
            modified_at: Utc::now(),
            size,
            padding: slicer.padding(),
            parity_shard_num: self.config.parity_shard_num,
            shard_size: self.config.shard_size,
        };
        self.meta.set_file_record(path, &record).await?;
        info!(
            path = %path,
            size,
            stripes = stripe_index,
            padding = record.padding,
            "Upload complete"
        );
        Ok(())
    }

    /// Download the file stored under `path`
    ///
    /// Tolerates up to the file's recorded parity budget in missing or
    /// failing shard servers; never returns partially reconstructed
    /// output.
    #[instrument(skip(self))]
    pub async fn download(&self, path: &str) -> Result<Bytes> {
        let servers = self.meta.list_servers().await?;
        let record = self.meta.file_record(path).await?;
        record.validate(path)?;

        let by_id: HashMap<&str, &ServerRecord> =
            servers.iter().map(|s| (s.id.as_str(), s)).collect();
        let stores: Vec<Option<Arc<dyn ShardStore>>> = record
            .shards
            .iter()
            .enumerate()
            .map(|(j, id)| match by_id.get(id.as_str()) {
                Some(server) => match self.provider.connect(server) {
                    Ok(store) => Some(store),
                    Err(e) => {
                        warn!(path = %path, shard = j, server = %id, error = %e,
                            "Shard server unreachable, treating as missing");
                        None
                    }
                },
                None => {
                    warn!(path = %path, shard = j, server = %id,
                        "Shard server absent from registry");
                    None
                }
            })
            .collect();

        let allowed = record.parity_shard_num;
        let lost = stores.iter().filter(|s| s.is_none()).count();
        if lost > allowed {
            return Err(DistNetDiskError::Corrupt {
                path: path.to_string(),
                lost,
                allowed,
            });
        }

        // Geometry comes from the record, not this client's config: the
        // file may have been uploaded under different shard counts.
        let data_shard_num = record.data_shard_num();
        let codec = ShardCodec::new(data_shard_num, record.parity_shard_num)?;
        let keys: Vec<String> = (0..record.total_shards())
            .map(|j| shard_key(path, j))
            .collect();

        let mut output =
            Vec::with_capacity((record.stripe_count() * record.stripe_bytes()) as usize);
        for stripe_index in 0..record.stripe_count() {
            let fetches = stores
                .iter()
                .zip(&keys)
                .enumerate()
                .map(|(j, (store, key))| async move {
                    match store {
                        Some(store) => match store.download_part(key, stripe_index).await {
                            Ok(bytes) => Some(bytes.to_vec()),
                            Err(e) => {
                                warn!(path = %path, stripe = stripe_index, shard = j, error = %e,
                                    "Part fetch failed, treating shard as missing");
                                None
                            }
                        },
                        None => None,
                    }
                });
            let shards: Vec<Option<Vec<u8>>> = join_all(fetches).await;

            // Availability can change mid-download; re-check the budget
            // before reconstructing each stripe.
            let missing = shards.iter().filter(|s| s.is_none()).count();
            if missing > allowed {
                return Err(DistNetDiskError::Corrupt {
                    path: path.to_string(),
                    lost: missing,
                    allowed,
                });
            }

            let rebuilt = codec.reconstruct(shards)?;
            for shard in rebuilt.into_iter().take(data_shard_num) {
                output.extend_from_slice(&shard);
            }
        }

        // Padding only ever exists at the very end; the recorded size is
        // the sole truth for output length.
        output.truncate(record.size as usize);
        info!(path = %path, size = record.size, "Download complete");
        Ok(Bytes::from(output))
    }
}
