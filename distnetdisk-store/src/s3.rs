//! HTTP shard store
//!
//! Speaks the S3-flavored multipart protocol of the shard servers:
//! objects live at `{endpoint}/{bucket}/{key}`, sessions are driven with
//! the `uploads`, `uploadId` and `partNumber` query parameters, and the
//! part number of a shard object is its stripe index.

use crate::backend::{ShardStore, ShardStoreProvider};
use bytes::Bytes;
use distnetdisk_core::error::{DistNetDiskError, Result};
use distnetdisk_core::record::ServerRecord;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct BeginUploadResponse {
    upload_id: String,
}

/// Shard store backed by one server's HTTP endpoint
pub struct HttpShardStore {
    http: Client,
    endpoint: String,
    bucket: String,
}

impl HttpShardStore {
    /// Create a store for one endpoint, sharing an HTTP client
    pub fn new(http: Client, endpoint: &str, bucket: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    async fn check(response: Response, op: &str, key: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(DistNetDiskError::Transport(format!(
                "{op} failed: key = {key}, object or part not found"
            )));
        }
        Err(DistNetDiskError::Transport(format!(
            "{op} failed: key = {key}, status = {status}, {message}"
        )))
    }
}

#[async_trait::async_trait]
impl ShardStore for HttpShardStore {
    async fn begin_upload(&self, key: &str) -> Result<String> {
        let response = self
            .http
            .post(self.object_url(key))
            .query(&[("uploads", "")])
            .send()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("begin upload failed: {e}")))?;
        let response = Self::check(response, "begin upload", key).await?;
        let body: BeginUploadResponse = response
            .json()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("begin upload failed: {e}")))?;
        debug!(key = %key, upload_id = %body.upload_id, "Upload session opened");
        Ok(body.upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_index: u64,
        data: Bytes,
    ) -> Result<()> {
        let response = self
            .http
            .put(self.object_url(key))
            .query(&[
                ("partNumber", part_index.to_string()),
                ("uploadId", upload_id.to_string()),
            ])
            .body(data)
            .send()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("upload part failed: {e}")))?;
        Self::check(response, "upload part", key).await?;
        Ok(())
    }

    async fn commit_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.object_url(key))
            .query(&[("uploadId", upload_id)])
            .send()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("commit upload failed: {e}")))?;
        Self::check(response, "commit upload", key).await?;
        debug!(key = %key, upload_id = %upload_id, "Upload session committed");
        Ok(())
    }

    async fn download_part(&self, key: &str, part_index: u64) -> Result<Bytes> {
        let response = self
            .http
            .get(self.object_url(key))
            .query(&[("partNumber", part_index.to_string())])
            .send()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("download part failed: {e}")))?;
        let response = Self::check(response, "download part", key).await?;
        response
            .bytes()
            .await
            .map_err(|e| DistNetDiskError::Transport(format!("download part failed: {e}")))
    }
}

/// Connects [`HttpShardStore`]s for registry entries, sharing one
/// connection pool across servers
pub struct HttpShardStoreProvider {
    http: Client,
    bucket: String,
}

impl HttpShardStoreProvider {
    /// Create a provider for the given bucket namespace
    pub fn new(bucket: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DistNetDiskError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            bucket: bucket.to_string(),
        })
    }
}

impl ShardStoreProvider for HttpShardStoreProvider {
    fn connect(&self, server: &ServerRecord) -> Result<Arc<dyn ShardStore>> {
        Ok(Arc::new(HttpShardStore::new(
            self.http.clone(),
            &server.url,
            &self.bucket,
        )))
    }
}
