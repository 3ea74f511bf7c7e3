mod error;
mod path;
mod traits;

pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::ObjectStoreError;
pub use path::{attachment_path, sanitize_file_name};
pub use traits::{DownloadTarget, ObjectStore, UploadTarget};
