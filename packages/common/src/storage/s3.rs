use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use serde::Deserialize;
use tracing::debug;

use super::error::ObjectStoreError;
use super::traits::{DownloadTarget, ObjectStore, UploadTarget};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    pub bucket: String,
    /// Region name. Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Uses AWS when absent.
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Address the bucket by path instead of virtual host. Default: false.
    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".into()
}

/// Object store backed by an S3-compatible bucket using presigned URLs.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    upload_ttl: Duration,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings, upload_ttl: Duration) -> Result<Self, ObjectStoreError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| ObjectStoreError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| ObjectStoreError::Config(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| ObjectStoreError::Config(e.to_string()))?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        debug!(bucket = %settings.bucket, path_style = settings.path_style, "S3 bucket configured");
        Ok(Self { bucket, upload_ttl })
    }
}

fn ttl_secs(ttl: Duration) -> u32 {
    u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX)
}

/// Pull the `X-Amz-Signature` value out of a presigned URL.
fn signature_of(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("X-Amz-Signature="))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn reserve_upload_target(&self, path: &str) -> Result<UploadTarget, ObjectStoreError> {
        let url = self
            .bucket
            .presign_put(path, ttl_secs(self.upload_ttl), None, None)
            .await
            .map_err(|e| ObjectStoreError::Signing {
                operation: "upload",
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let token = signature_of(&url).unwrap_or_default().to_string();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.upload_ttl).unwrap_or(chrono::Duration::zero());

        Ok(UploadTarget {
            url,
            token,
            expires_at,
        })
    }

    async fn reserve_download_target(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<DownloadTarget, ObjectStoreError> {
        let url = self
            .bucket
            .presign_get(path, ttl_secs(ttl), None)
            .await
            .map_err(|e| ObjectStoreError::Signing {
                operation: "download",
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(DownloadTarget {
            url,
            expires_at: Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        })
    }

    async fn object_size(&self, path: &str) -> Result<Option<u64>, ObjectStoreError> {
        match self.bucket.head_object(path).await {
            Ok((_, 404)) => Ok(None),
            Ok((head, code)) if (200..300).contains(&code) => Ok(head
                .content_length
                .and_then(|len| u64::try_from(len).ok())),
            Ok((_, code)) => Err(ObjectStoreError::Backend(format!(
                "HEAD {path} returned status {code}"
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(ObjectStoreError::Backend(e.to_string())),
        }
    }

    async fn remove(&self, path: &str) -> Result<bool, ObjectStoreError> {
        if self.object_size(path).await?.is_none() {
            debug!(path, "Nothing to remove");
            return Ok(false);
        }
        let response = self
            .bucket
            .delete_object(path)
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        Ok((200..300).contains(&response.status_code()))
    }
}
