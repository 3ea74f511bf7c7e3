use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::{AttachmentDeclaration, AttachmentResponse, PendingUploadResponse};
use crate::entity::message::{self, MessageKind};

/// Request body for sending a message.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    /// Text content. May be omitted when attachments are present.
    #[schema(example = "See you at 10:30")]
    pub content: Option<String>,
    pub reply_to_message_id: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDeclaration>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EditMessageRequest {
    #[schema(example = "See you at 11:00")]
    pub content: String,
}

/// Response DTO for a single message.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    pub thread_id: i32,
    pub sender_id: i32,
    /// Absent for attachment-only and deleted messages.
    pub content: Option<String>,
    pub kind: MessageKind,
    pub reply_to_message_id: Option<i32>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentResponse>,
}

impl MessageResponse {
    pub fn new(model: message::Model, attachments: Vec<AttachmentResponse>) -> Self {
        Self {
            id: model.id,
            thread_id: model.thread_id,
            sender_id: model.sender_id,
            content: model.content,
            kind: model.kind,
            reply_to_message_id: model.reply_to_message_id,
            is_edited: model.is_edited,
            edited_at: model.edited_at,
            is_deleted: model.is_deleted,
            deleted_at: model.deleted_at,
            created_at: model.created_at,
            attachments,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: i32,
    pub message: MessageResponse,
    /// One entry per declared attachment, in request order.
    pub pending_uploads: Vec<PendingUploadResponse>,
}

/// Response for edit and delete.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageActionResponse {
    pub success: bool,
    pub message: MessageResponse,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct MessagePageQuery {
    /// ID of the oldest message of the previous page. Omit for the newest page.
    pub cursor: Option<i32>,
    /// Page size, 1-80. Default: 40.
    pub limit: Option<u64>,
}

/// One page of history in chronological order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessagePageResponse {
    pub messages: Vec<MessageResponse>,
    /// Pass as `cursor` to fetch older messages. Absent on the oldest page.
    pub next_cursor: Option<i32>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search text.
    pub q: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    /// Newest first, at most 50.
    pub messages: Vec<MessageResponse>,
}

/// Short summary of a thread's latest message.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessagePreview {
    pub id: i32,
    pub sender_id: i32,
    pub content: Option<String>,
    pub kind: MessageKind,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<message::Model> for MessagePreview {
    fn from(model: message::Model) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            content: model.content,
            kind: model.kind,
            is_deleted: model.is_deleted,
            created_at: model.created_at,
        }
    }
}
