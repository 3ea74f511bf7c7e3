//! Second half of the attachment handshake: confirming uploads and issuing
//! download targets.

use std::time::Duration;

use common::limits::MAX_ATTACHMENT_BYTES;
use common::storage::{DownloadTarget, ObjectStore};
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{attachment, message};
use crate::error::AppError;
use crate::services::membership::{find_member, find_message};

async fn find_attachment<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<(attachment::Model, message::Model), AppError> {
    let attachment = attachment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attachment not found".into()))?;
    let message = find_message(db, attachment.message_id).await?;
    Ok((attachment, message))
}

/// Record the size of an uploaded attachment once its bytes are in storage.
///
/// Only the sender may confirm. Confirming twice returns the stored row.
pub async fn confirm_upload(
    db: &DatabaseConnection,
    object_store: &dyn ObjectStore,
    caller_id: i32,
    attachment_id: Uuid,
) -> Result<attachment::Model, AppError> {
    let (attachment, message) = find_attachment(db, attachment_id).await?;
    if message.sender_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the sender can confirm an upload".into(),
        ));
    }
    if !attachment.is_pending() {
        return Ok(attachment);
    }

    let size = object_store
        .object_size(&attachment.storage_path)
        .await?
        .ok_or_else(|| {
            AppError::conflict(
                "upload_missing",
                "No uploaded file found for this attachment",
            )
        })?;

    if size > MAX_ATTACHMENT_BYTES {
        warn!(
            %attachment_id,
            size, "Uploaded object exceeds the size ceiling, removing it"
        );
        if let Err(e) = object_store.remove(&attachment.storage_path).await {
            warn!(%attachment_id, "Failed to remove oversized upload: {}", e);
        }
        return Err(AppError::validation(
            "file_too_large",
            format!("File exceeds the maximum size of {MAX_ATTACHMENT_BYTES} bytes"),
        ));
    }

    let mut active: attachment::ActiveModel = attachment.into();
    active.byte_size = Set(Some(i64::try_from(size).unwrap_or(i64::MAX)));
    let updated = active.update(db).await?;

    info!(%attachment_id, size, "Attachment upload confirmed");
    Ok(updated)
}

/// Issue a time-limited download target for an attachment.
///
/// Requires membership of the owning thread. Attachments of soft-deleted
/// messages stay downloadable.
pub async fn download_target(
    db: &DatabaseConnection,
    object_store: &dyn ObjectStore,
    caller_id: i32,
    attachment_id: Uuid,
    ttl: Duration,
) -> Result<(attachment::Model, DownloadTarget), AppError> {
    let (attachment, message) = find_attachment(db, attachment_id).await?;
    if find_member(db, message.thread_id, caller_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotAMember);
    }
    if attachment.is_pending() {
        return Err(AppError::conflict(
            "upload_pending",
            "The file has not finished uploading",
        ));
    }

    let target = object_store
        .reserve_download_target(&attachment.storage_path, ttl)
        .await?;
    Ok((attachment, target))
}
