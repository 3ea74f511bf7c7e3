use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::block;

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlockToggleResponse {
    pub success: bool,
    /// Whether the caller now blocks the user.
    pub blocked: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlockedUser {
    pub user_id: i32,
    pub blocked_at: DateTime<Utc>,
}

impl From<block::Model> for BlockedUser {
    fn from(model: block::Model) -> Self {
        Self {
            user_id: model.blocked_id,
            blocked_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlockedListResponse {
    pub blocked: Vec<BlockedUser>,
}
