use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::models::attachment::{AttachmentResponse, ConfirmUploadResponse, DownloadUrlResponse};
use crate::services::upload;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = "Files",
    operation_id = "confirmUpload",
    summary = "Confirm an attachment upload",
    description = "Called by the sender after uploading the bytes to the signed target. Records the stored size; objects over 15 MiB are removed and rejected. Confirming again returns the recorded attachment.",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    responses(
        (status = 200, description = "Upload confirmed", body = ConfirmUploadResponse),
        (status = 400, description = "Validation error (file_too_large)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the sender (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Attachment not found", body = ErrorBody),
        (status = 409, description = "Conflict (upload_missing)", body = ErrorBody),
        (status = 502, description = "Object storage unavailable (DEPENDENCY_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, attachment_id = %id))]
pub async fn confirm_upload(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmUploadResponse>, AppError> {
    let attachment =
        upload::confirm_upload(&state.db, state.object_store.as_ref(), caller.user_id, id).await?;
    Ok(Json(ConfirmUploadResponse {
        success: true,
        attachment: AttachmentResponse::from(attachment),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/download-url",
    tag = "Files",
    operation_id = "getDownloadUrl",
    summary = "Get a short-lived download URL",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    responses(
        (status = 200, description = "Signed download target", body = DownloadUrlResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not a member (NOT_A_MEMBER)", body = ErrorBody),
        (status = 404, description = "Attachment not found", body = ErrorBody),
        (status = 409, description = "Conflict (upload_pending)", body = ErrorBody),
        (status = 502, description = "Object storage unavailable (DEPENDENCY_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state), fields(caller_id = caller.user_id, attachment_id = %id))]
pub async fn download_url(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DownloadUrlResponse>, AppError> {
    let ttl = Duration::from_secs(state.config.storage.download_url_ttl_secs);
    let (attachment, download) =
        upload::download_target(&state.db, state.object_store.as_ref(), caller.user_id, id, ttl)
            .await?;
    Ok(Json(DownloadUrlResponse {
        success: true,
        attachment_id: attachment.id,
        file_name: attachment.file_name,
        download,
    }))
}
