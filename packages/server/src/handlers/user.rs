use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::models::user::{BlockToggleResponse, BlockedListResponse};
use crate::services::membership;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/block",
    tag = "Users",
    operation_id = "toggleBlock",
    summary = "Block or unblock a user",
    description = "Toggles the caller's block on the user. A block only prevents new direct threads; existing threads and history are untouched.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Block toggled", body = BlockToggleResponse),
        (status = 400, description = "Validation error (cannot_block_self)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, other_id = id))]
pub async fn toggle_block(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlockToggleResponse>, AppError> {
    let blocked = membership::toggle_block(&state.db, caller.user_id, id).await?;
    Ok(Json(BlockToggleResponse {
        success: true,
        blocked,
    }))
}

#[utoipa::path(
    get,
    path = "/blocked",
    tag = "Users",
    operation_id = "listBlocked",
    summary = "List users the caller has blocked",
    responses(
        (status = 200, description = "Blocked users, newest first", body = BlockedListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id))]
pub async fn list_blocked(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<BlockedListResponse>, AppError> {
    let blocked = membership::blocked_by(&state.db, caller.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(BlockedListResponse { blocked }))
}
