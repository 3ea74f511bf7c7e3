use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

use super::error::ObjectStoreError;
use super::traits::{DownloadTarget, ObjectStore, UploadTarget};

/// Process-local object store.
///
/// Issues `memory://` targets and records uploaded sizes in a map. Used for
/// local runs without an S3 endpoint and as the test double for the gateway.
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, u64>>,
    upload_ttl: Duration,
    /// Number of upload reservations still allowed before every further one
    /// fails. `usize::MAX` means never fail.
    upload_budget: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new(upload_ttl: Duration) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            upload_ttl,
            upload_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Record an upload of `size` bytes at `path`, as a client would.
    pub fn put(&self, path: &str, size: u64) {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), size);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    /// Let `remaining` more upload reservations succeed, then fail the rest.
    pub fn fail_uploads_after(&self, remaining: usize) {
        self.upload_budget.store(remaining, Ordering::SeqCst);
    }

    fn take_upload_budget(&self) -> bool {
        self.upload_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(2 * 60 * 60))
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn expiry_after(ttl: Duration) -> chrono::DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn reserve_upload_target(&self, path: &str) -> Result<UploadTarget, ObjectStoreError> {
        if !self.take_upload_budget() {
            return Err(ObjectStoreError::Backend(format!(
                "upload reservation refused for {path}"
            )));
        }
        let token = random_token();
        Ok(UploadTarget {
            url: format!("memory://{path}?token={token}"),
            token,
            expires_at: expiry_after(self.upload_ttl),
        })
    }

    async fn reserve_download_target(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<DownloadTarget, ObjectStoreError> {
        let expires_at = expiry_after(ttl);
        Ok(DownloadTarget {
            url: format!("memory://{path}?expires={}", expires_at.timestamp()),
            expires_at,
        })
    }

    async fn object_size(&self, path: &str) -> Result<Option<u64>, ObjectStoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .copied())
    }

    async fn remove(&self, path: &str) -> Result<bool, ObjectStoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
            .is_some())
    }
}
