use thiserror::Error;

/// Errors raised by an object-store backend.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// The backend rejected the request or could not be reached.
    #[error("object store request failed: {0}")]
    Backend(String),
    /// Signing a transfer URL failed.
    #[error("failed to sign {operation} URL for {path}: {reason}")]
    Signing {
        operation: &'static str,
        path: String,
        reason: String,
    },
    /// The store is misconfigured (bad credentials, bucket, region).
    #[error("object store misconfigured: {0}")]
    Config(String),
}
