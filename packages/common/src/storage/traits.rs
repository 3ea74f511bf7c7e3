use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ObjectStoreError;

/// Pre-authorised target a client uploads attachment bytes to.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct UploadTarget {
    /// Signed URL accepting a single `PUT` of the object bytes.
    pub url: String,
    /// Signature token bound to the URL.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Pre-authorised, time-limited URL for downloading an object.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct DownloadTarget {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Object storage for attachment bytes.
///
/// The service never proxies file contents: it only hands out signed
/// transfer targets and inspects what clients have stored.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue a signed upload target for `path`.
    async fn reserve_upload_target(&self, path: &str) -> Result<UploadTarget, ObjectStoreError>;

    /// Issue a signed download target for `path` that expires after `ttl`.
    async fn reserve_download_target(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<DownloadTarget, ObjectStoreError>;

    /// Size of the stored object, or `None` if nothing has been uploaded yet.
    async fn object_size(&self, path: &str) -> Result<Option<u64>, ObjectStoreError>;

    /// Remove an object.
    ///
    /// Returns `true` if the object was removed, `false` if it did not exist.
    async fn remove(&self, path: &str) -> Result<bool, ObjectStoreError>;
}
