use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::AppJson;
use crate::models::shared::SuccessResponse;
use crate::models::thread::*;
use crate::services::{history, membership, thread};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/direct",
    tag = "Threads",
    operation_id = "openDirectThread",
    summary = "Open a direct conversation",
    description = "Returns the existing direct thread between the caller and `other_user_id`, creating it if needed. Fails with `blocked` if either user has blocked the other.",
    request_body = OpenDirectRequest,
    responses(
        (status = 200, description = "Existing thread", body = OpenDirectResponse),
        (status = 201, description = "Thread created", body = OpenDirectResponse),
        (status = 400, description = "Validation error (cannot_message_self)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 409, description = "Conflict (blocked)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id, other_id = payload.other_user_id))]
pub async fn open_direct(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<OpenDirectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (model, created) =
        thread::open_direct(&state.db, caller.user_id, payload.other_user_id).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(OpenDirectResponse {
            success: true,
            thread_id: model.id,
            created,
            thread: model.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/group",
    tag = "Threads",
    operation_id = "createGroupThread",
    summary = "Create a group conversation",
    description = "Creates a titled group with the caller as owner. The caller is always a member; the member set must hold at least three distinct users.",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = CreateGroupResponse),
        (status = 400, description = "Validation error (too_few_members, missing_title, title_too_long)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id))]
pub async fn create_group(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = thread::create_group(
        &state.db,
        caller.user_id,
        &payload.title,
        &payload.member_ids,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            success: true,
            thread_id: model.id,
            thread: model.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Threads",
    operation_id = "listThreads",
    summary = "List the caller's threads",
    description = "Every thread the caller belongs to with last-message preview, unread count and the caller's pin/mute flags. Pinned threads first, then by latest activity.",
    responses(
        (status = 200, description = "Thread list", body = ThreadListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id))]
pub async fn list_threads(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<ThreadListResponse>, AppError> {
    let threads =
        history::list_threads(&state.db, state.directory.as_ref(), caller.user_id).await?;
    Ok(Json(ThreadListResponse { threads }))
}

#[utoipa::path(
    put,
    path = "/{id}/mute",
    tag = "Threads",
    operation_id = "setThreadMuted",
    summary = "Mute or unmute a thread for the caller",
    params(("id" = i32, Path, description = "Thread ID")),
    request_body = SetMutedRequest,
    responses(
        (status = 200, description = "Mute flag updated", body = MutedResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn set_muted(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetMutedRequest>,
) -> Result<Json<MutedResponse>, AppError> {
    let muted = membership::set_muted(&state.db, caller.user_id, id, payload.muted).await?;
    Ok(Json(MutedResponse {
        success: true,
        muted,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/leave",
    tag = "Threads",
    operation_id = "leaveThread",
    summary = "Leave a group thread",
    description = "Removes the caller's membership. Direct threads cannot be left.",
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Left the group", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
        (status = 409, description = "Conflict (cannot_leave_direct)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn leave_thread(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, AppError> {
    membership::leave(&state.db, caller.user_id, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/{id}/pin",
    tag = "Threads",
    operation_id = "toggleThreadPin",
    summary = "Pin or unpin a thread for the caller",
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Pin toggled", body = PinnedResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn toggle_pin(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PinnedResponse>, AppError> {
    let pinned = membership::toggle_thread_pin(&state.db, caller.user_id, id).await?;
    Ok(Json(PinnedResponse {
        success: true,
        pinned,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Threads",
    operation_id = "addThreadMembers",
    summary = "Add users to a group",
    description = "Owner only. Users that already belong to the group are skipped.",
    params(("id" = i32, Path, description = "Thread ID")),
    request_body = AddMembersRequest,
    responses(
        (status = 200, description = "Members added", body = AddMembersResponse),
        (status = 400, description = "Validation error (no_members, too_many_members)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member or not the owner", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
        (status = 409, description = "Conflict (not_a_group)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn add_members(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AddMembersRequest>,
) -> Result<Json<AddMembersResponse>, AppError> {
    let added = membership::add_members(&state.db, caller.user_id, id, &payload.user_ids).await?;
    Ok(Json(AddMembersResponse {
        success: true,
        added,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/info",
    tag = "Threads",
    operation_id = "getThreadInfo",
    summary = "Members, shared files and pinned messages of a thread",
    description = "Members with directory profiles, the 30 most recent confirmed attachments of live messages, and up to 20 of the caller's pinned messages.",
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread info", body = ThreadInfoResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn thread_info(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ThreadInfoResponse>, AppError> {
    let info =
        history::thread_info(&state.db, state.directory.as_ref(), caller.user_id, id).await?;
    Ok(Json(info))
}
