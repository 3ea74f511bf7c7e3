//! Sending, editing, soft-deleting and per-user hiding of messages.

use chrono::{Duration, Utc};
use common::limits::{
    EDIT_WINDOW_MINUTES, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENTS_PER_MESSAGE, MAX_CONTENT_CHARS,
};
use common::storage::{ObjectStore, UploadTarget, attachment_path};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::message::MessageKind;
use crate::entity::{attachment, message, message_hide};
use crate::error::AppError;
use crate::services::membership::{find_member, find_message, require_member};

/// Attachment declared by the sender before any bytes are transferred.
#[derive(Debug, Clone)]
pub struct AttachmentSpec {
    pub file_name: String,
    pub mime_type: String,
    /// Size announced by the client, if it knows it.
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub content: Option<String>,
    pub reply_to_message_id: Option<i32>,
    pub attachments: Vec<AttachmentSpec>,
}

/// A reserved attachment row plus where the client should upload its bytes.
#[derive(Debug)]
pub struct PendingUpload {
    pub attachment: attachment::Model,
    pub target: UploadTarget,
}

#[derive(Debug)]
pub struct SentMessage {
    pub message: message::Model,
    pub uploads: Vec<PendingUpload>,
}

/// Message kind implied by its attachments: the first one decides.
pub fn derive_kind(attachments: &[AttachmentSpec]) -> MessageKind {
    match attachments.first() {
        Some(first) if first.mime_type.starts_with("image/") => MessageKind::Image,
        Some(_) => MessageKind::File,
        None => MessageKind::Text,
    }
}

/// Trim content; whitespace-only content counts as absent.
pub fn normalize_content(content: Option<&str>) -> Option<String> {
    content
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn validate_content_length(content: &str) -> Result<(), AppError> {
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::validation(
            "content_too_long",
            format!("Messages are limited to {MAX_CONTENT_CHARS} characters"),
        ));
    }
    Ok(())
}

fn validate_attachments(attachments: &[AttachmentSpec]) -> Result<(), AppError> {
    if attachments.len() > MAX_ATTACHMENTS_PER_MESSAGE {
        return Err(AppError::validation(
            "too_many_attachments",
            format!("At most {MAX_ATTACHMENTS_PER_MESSAGE} attachments per message"),
        ));
    }
    for spec in attachments {
        if spec.file_name.trim().is_empty() {
            return Err(AppError::validation(
                "invalid_file_name",
                "Attachment file name must not be empty",
            ));
        }
        if let Some(size) = spec.size
            && size > MAX_ATTACHMENT_BYTES
        {
            return Err(AppError::validation(
                "file_too_large",
                format!(
                    "'{}' exceeds the maximum size of {MAX_ATTACHMENT_BYTES} bytes",
                    spec.file_name.trim()
                ),
            ));
        }
    }
    Ok(())
}

/// Persist a message and reserve its attachments.
///
/// Every check runs before the first write. The message row and all
/// attachment reservations share one transaction, so a failed upload
/// reservation leaves no message behind.
pub async fn send(
    db: &DatabaseConnection,
    object_store: &dyn ObjectStore,
    caller_id: i32,
    thread_id: i32,
    new_message: NewMessage,
) -> Result<SentMessage, AppError> {
    require_member(db, thread_id, caller_id).await?;

    let content = normalize_content(new_message.content.as_deref());
    if content.is_none() && new_message.attachments.is_empty() {
        return Err(AppError::validation(
            "nothing_to_send",
            "A message needs content or at least one attachment",
        ));
    }
    if let Some(content) = &content {
        validate_content_length(content)?;
    }
    validate_attachments(&new_message.attachments)?;

    if let Some(reply_to) = new_message.reply_to_message_id {
        let parent = message::Entity::find_by_id(reply_to).one(db).await?;
        if parent.is_none_or(|p| p.thread_id != thread_id) {
            return Err(AppError::validation(
                "invalid_reply",
                "Replies must reference a message in the same thread",
            ));
        }
    }

    let kind = derive_kind(&new_message.attachments);
    let now = Utc::now();
    let txn = db.begin().await?;

    let message = message::ActiveModel {
        thread_id: Set(thread_id),
        sender_id: Set(caller_id),
        content: Set(content),
        kind: Set(kind),
        reply_to_message_id: Set(new_message.reply_to_message_id),
        is_edited: Set(false),
        edited_at: Set(None),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut uploads = Vec::with_capacity(new_message.attachments.len());
    for spec in new_message.attachments {
        let storage_path = attachment_path(thread_id, message.id, &spec.file_name);
        let attachment = attachment::ActiveModel {
            id: Set(Uuid::now_v7()),
            message_id: Set(message.id),
            file_name: Set(spec.file_name.trim().to_string()),
            mime_type: Set(spec.mime_type),
            byte_size: Set(None),
            storage_path: Set(storage_path.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let target = match object_store.reserve_upload_target(&storage_path).await {
            Ok(target) => target,
            Err(e) => {
                warn!(
                    thread_id,
                    message_id = message.id,
                    "Upload reservation failed, discarding message: {}",
                    e
                );
                txn.rollback().await?;
                return Err(e.into());
            }
        };
        uploads.push(PendingUpload { attachment, target });
    }

    txn.commit().await?;

    info!(
        thread_id,
        message_id = message.id,
        sender_id = caller_id,
        attachments = uploads.len(),
        "Message sent"
    );
    Ok(SentMessage { message, uploads })
}

/// Replace the content of the caller's own message within the edit window.
pub async fn edit(
    db: &DatabaseConnection,
    caller_id: i32,
    message_id: i32,
    new_content: &str,
) -> Result<message::Model, AppError> {
    let message = find_message(db, message_id).await?;
    if message.sender_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the sender can edit a message".into(),
        ));
    }
    if message.is_deleted {
        return Err(AppError::conflict(
            "already_deleted",
            "Deleted messages cannot be edited",
        ));
    }

    let now = Utc::now();
    if now - message.created_at > Duration::minutes(EDIT_WINDOW_MINUTES) {
        return Err(AppError::expired(
            "edit_window_expired",
            format!("Messages can only be edited within {EDIT_WINDOW_MINUTES} minutes"),
        ));
    }

    let content = normalize_content(Some(new_content)).ok_or_else(|| {
        AppError::validation("empty_content", "Edited content must not be empty")
    })?;
    validate_content_length(&content)?;

    let mut active: message::ActiveModel = message.into();
    active.content = Set(Some(content));
    active.is_edited = Set(true);
    active.edited_at = Set(Some(now));
    let updated = active.update(db).await?;

    info!(message_id, "Message edited");
    Ok(updated)
}

/// Soft-delete the caller's own message.
///
/// Content is cleared; attachment rows and their stored objects are kept.
/// Deleting an already deleted message is a no-op.
pub async fn soft_delete(
    db: &DatabaseConnection,
    caller_id: i32,
    message_id: i32,
) -> Result<message::Model, AppError> {
    let message = find_message(db, message_id).await?;
    if message.sender_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the sender can delete a message".into(),
        ));
    }
    if message.is_deleted {
        return Ok(message);
    }

    let mut active: message::ActiveModel = message.into();
    active.content = Set(None);
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(Utc::now()));
    let updated = active.update(db).await?;

    info!(message_id, "Message deleted");
    Ok(updated)
}

/// Hide a message from the caller's own view only.
pub async fn hide_for_me(
    db: &DatabaseConnection,
    caller_id: i32,
    message_id: i32,
) -> Result<(), AppError> {
    let message = find_message(db, message_id).await?;
    if find_member(db, message.thread_id, caller_id)
        .await?
        .is_none()
    {
        return Err(AppError::Forbidden(
            "You cannot hide messages outside your threads".into(),
        ));
    }

    let row = message_hide::ActiveModel {
        user_id: Set(caller_id),
        message_id: Set(message_id),
        hidden_at: Set(Utc::now()),
    };
    let result = message_hide::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                message_hide::Column::UserId,
                message_hide::Column::MessageId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
