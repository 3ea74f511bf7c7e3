use chrono::{DateTime, Utc};
use common::storage::{DownloadTarget, UploadTarget};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::attachment;

/// Attachment announced in a send request. Bytes are uploaded separately.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AttachmentDeclaration {
    #[schema(example = "lab-results.pdf")]
    pub file_name: String,
    /// MIME type. Guessed from the file name when absent.
    #[schema(example = "application/pdf")]
    pub mime_type: Option<String>,
    /// Size in bytes, if known. Checked against the 15 MiB ceiling up front.
    #[schema(example = 48213)]
    pub size: Option<u64>,
}

/// Response DTO for a single attachment.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentResponse {
    /// Attachment ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: Uuid,
    pub message_id: i32,
    #[schema(example = "lab-results.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// Confirmed size in bytes; absent while the upload is pending.
    pub byte_size: Option<i64>,
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(model: attachment::Model) -> Self {
        Self {
            pending: model.is_pending(),
            id: model.id,
            message_id: model.message_id,
            file_name: model.file_name,
            mime_type: model.mime_type,
            byte_size: model.byte_size,
            created_at: model.created_at,
        }
    }
}

/// A reserved attachment and the signed target to upload its bytes to.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PendingUploadResponse {
    pub attachment_id: Uuid,
    pub file_name: String,
    pub upload: UploadTarget,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConfirmUploadResponse {
    pub success: bool,
    pub attachment: AttachmentResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DownloadUrlResponse {
    pub success: bool,
    pub attachment_id: Uuid,
    pub file_name: String,
    pub download: DownloadTarget,
}
