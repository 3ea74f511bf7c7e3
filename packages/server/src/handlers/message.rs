use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::AppJson;
use crate::models::attachment::{AttachmentDeclaration, AttachmentResponse, PendingUploadResponse};
use crate::models::message::*;
use crate::models::shared::SuccessResponse;
use crate::models::thread::PinnedResponse;
use crate::services::message::{AttachmentSpec, NewMessage};
use crate::services::{history, membership, message, search};
use crate::state::AppState;

/// Use the declared MIME type, or guess one from the file name.
fn resolve_mime(declaration: &AttachmentDeclaration) -> String {
    declaration
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(&declaration.file_name)
                .first_or_octet_stream()
                .to_string()
        })
}

#[utoipa::path(
    get,
    path = "/{id}/messages",
    tag = "Messages",
    operation_id = "listMessages",
    summary = "Page through a thread's history",
    description = "Returns messages oldest to newest. Omit `cursor` for the newest page, which also advances the caller's read marker; pass `next_cursor` to go further back. Messages the caller hid are skipped.",
    params(("id" = i32, Path, description = "Thread ID"), MessagePageQuery),
    responses(
        (status = 200, description = "One page of messages", body = MessagePageResponse),
        (status = 400, description = "Validation error (invalid_cursor)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, query), fields(caller_id = caller.user_id, thread_id = id, cursor = ?query.cursor))]
pub async fn list_messages(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<MessagePageQuery>,
) -> Result<Json<MessagePageResponse>, AppError> {
    let page =
        history::list_messages(&state.db, caller.user_id, id, query.cursor, query.limit).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/{id}/messages",
    tag = "Messages",
    operation_id = "sendMessage",
    summary = "Send a message",
    description = "Stores a text message and reserves declared attachments. Each entry of `pending_uploads` carries a signed target to upload the file to, after which the sender confirms it via `POST /files/{id}/confirm`.",
    params(("id" = i32, Path, description = "Thread ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = SendMessageResponse),
        (status = 400, description = "Validation error (nothing_to_send, content_too_long, too_many_attachments, file_too_large, invalid_reply)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
        (status = 502, description = "Object storage unavailable (DEPENDENCY_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id, thread_id = id, attachments = payload.attachments.len()))]
pub async fn send_message(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attachments = payload
        .attachments
        .iter()
        .map(|d| AttachmentSpec {
            mime_type: resolve_mime(d),
            file_name: d.file_name.clone(),
            size: d.size,
        })
        .collect();

    let sent = message::send(
        &state.db,
        state.object_store.as_ref(),
        caller.user_id,
        id,
        NewMessage {
            content: payload.content,
            reply_to_message_id: payload.reply_to_message_id,
            attachments,
        },
    )
    .await?;

    let mut attachments = Vec::with_capacity(sent.uploads.len());
    let mut pending_uploads = Vec::with_capacity(sent.uploads.len());
    for upload in sent.uploads {
        pending_uploads.push(PendingUploadResponse {
            attachment_id: upload.attachment.id,
            file_name: upload.attachment.file_name.clone(),
            upload: upload.target,
        });
        attachments.push(AttachmentResponse::from(upload.attachment));
    }

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message_id: sent.message.id,
            message: MessageResponse::new(sent.message, attachments),
            pending_uploads,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/search",
    tag = "Messages",
    operation_id = "searchMessages",
    summary = "Search a thread's messages",
    description = "Case-insensitive match over message content, newest first, at most 50 results. Deleted and hidden messages are excluded.",
    params(("id" = i32, Path, description = "Thread ID"), SearchQuery),
    responses(
        (status = 200, description = "Matching messages", body = SearchResponse),
        (status = 400, description = "Validation error (empty_query, query_too_long)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Thread not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, query), fields(caller_id = caller.user_id, thread_id = id))]
pub async fn search_messages(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let found = search::search_thread(
        &state.db,
        state.searcher.as_ref(),
        caller.user_id,
        id,
        &query.q,
    )
    .await?;
    Ok(Json(SearchResponse {
        messages: history::with_attachments(&state.db, found).await?,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Messages",
    operation_id = "editMessage",
    summary = "Edit a message",
    description = "Sender only, within 60 minutes of sending. Deleted messages cannot be edited.",
    params(("id" = i32, Path, description = "Message ID")),
    request_body = EditMessageRequest,
    responses(
        (status = 200, description = "Message edited", body = MessageActionResponse),
        (status = 400, description = "Validation error (empty_content, content_too_long)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the sender (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody),
        (status = 409, description = "Conflict (already_deleted) or edit window expired (EXPIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload), fields(caller_id = caller.user_id, message_id = id))]
pub async fn edit_message(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<EditMessageRequest>,
) -> Result<Json<MessageActionResponse>, AppError> {
    let edited = message::edit(&state.db, caller.user_id, id, &payload.content).await?;
    let mut rendered = history::with_attachments(&state.db, vec![edited]).await?;
    let message = rendered
        .pop()
        .ok_or_else(|| AppError::Internal("edited message vanished".into()))?;
    Ok(Json(MessageActionResponse {
        success: true,
        message,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Messages",
    operation_id = "deleteMessage",
    summary = "Delete a message for everyone",
    description = "Sender only. Clears the content and marks the message deleted; it stays in history as a tombstone. Repeating the call is a no-op.",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message deleted", body = MessageActionResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the sender (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, message_id = id))]
pub async fn delete_message(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageActionResponse>, AppError> {
    let deleted = message::soft_delete(&state.db, caller.user_id, id).await?;
    let mut rendered = history::with_attachments(&state.db, vec![deleted]).await?;
    let message = rendered
        .pop()
        .ok_or_else(|| AppError::Internal("deleted message vanished".into()))?;
    Ok(Json(MessageActionResponse {
        success: true,
        message,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/hide",
    tag = "Messages",
    operation_id = "hideMessage",
    summary = "Hide a message for the caller only",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message hidden", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Caller is not in the message's thread (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, message_id = id))]
pub async fn hide_message(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, AppError> {
    message::hide_for_me(&state.db, caller.user_id, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/{id}/pin",
    tag = "Messages",
    operation_id = "toggleMessagePin",
    summary = "Pin or unpin a message for the caller",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Pin toggled", body = PinnedResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, message_id = id))]
pub async fn toggle_pin(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PinnedResponse>, AppError> {
    let pinned = membership::toggle_message_pin(&state.db, caller.user_id, id).await?;
    Ok(Json(PinnedResponse {
        success: true,
        pinned,
    }))
}
