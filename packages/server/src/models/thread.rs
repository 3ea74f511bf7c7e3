use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentResponse;
use super::message::{MessagePreview, MessageResponse};
use crate::entity::thread::{self, ThreadKind};
use crate::entity::thread_member::MemberRole;
use crate::services::directory::Profile;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct OpenDirectRequest {
    #[schema(example = 42)]
    pub other_user_id: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    #[schema(example = "Care team")]
    pub title: String,
    /// Other members. The caller is always included.
    pub member_ids: Vec<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetMutedRequest {
    pub muted: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddMembersRequest {
    pub user_ids: Vec<i32>,
}

/// Response DTO for a thread.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ThreadResponse {
    pub id: i32,
    pub kind: ThreadKind,
    pub title: Option<String>,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<thread::Model> for ThreadResponse {
    fn from(model: thread::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            title: model.title,
            creator_id: model.creator_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OpenDirectResponse {
    pub success: bool,
    pub thread_id: i32,
    /// Whether this call created the thread.
    pub created: bool,
    pub thread: ThreadResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateGroupResponse {
    pub success: bool,
    pub thread_id: i32,
    pub thread: ThreadResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MutedResponse {
    pub success: bool,
    pub muted: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PinnedResponse {
    pub success: bool,
    pub pinned: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AddMembersResponse {
    pub success: bool,
    /// Users that were not already members.
    pub added: Vec<i32>,
}

/// One row of the caller's thread list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ThreadSummary {
    pub id: i32,
    pub kind: ThreadKind,
    pub title: Option<String>,
    /// Group title, or the other participant's name for direct threads.
    pub display_name: String,
    pub member_count: u64,
    pub last_message: Option<MessagePreview>,
    pub unread_count: u64,
    pub pinned: bool,
    pub muted: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ThreadListResponse {
    pub threads: Vec<ThreadSummary>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub user_id: i32,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub profile: Profile,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ThreadInfoResponse {
    pub thread: ThreadResponse,
    pub members: Vec<MemberResponse>,
    /// Most recent 30 confirmed attachments of live messages.
    pub recent_attachments: Vec<AttachmentResponse>,
    /// The caller's own pins, newest first, at most 20.
    pub pinned_messages: Vec<MessageResponse>,
}
