use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::ObjectStoreError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error kind. One of: `UNAUTHORIZED`, `NOT_A_MEMBER`,
    /// `FORBIDDEN`, `NOT_FOUND`, `VALIDATION_ERROR`, `CONFLICT`, `EXPIRED`,
    /// `DEPENDENCY_FAILURE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Operation-specific reason, e.g. `too_few_members` or `edit_window_expired`.
    #[schema(example = "too_few_members")]
    pub reason: Option<&'static str>,
    /// Human-readable error description.
    #[schema(example = "A group needs at least 3 members")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// No caller identity, or one that failed verification.
    Unauthorized,
    /// The caller is not a member of the thread.
    NotAMember,
    /// The caller lacks rights over the target.
    Forbidden(String),
    NotFound(String),
    Validation {
        reason: &'static str,
        message: String,
    },
    Conflict {
        reason: &'static str,
        message: String,
    },
    Expired {
        reason: &'static str,
        message: String,
    },
    /// The relational or object store failed.
    DependencyFailure(String),
    Internal(String),
}

impl AppError {
    pub fn validation(reason: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            reason,
            message: message.into(),
        }
    }

    pub fn conflict(reason: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            reason,
            message: message.into(),
        }
    }

    pub fn expired(reason: &'static str, message: impl Into<String>) -> Self {
        AppError::Expired {
            reason,
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotAMember => "NOT_A_MEMBER",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::Expired { .. } => "EXPIRED",
            AppError::DependencyFailure(_) => "DEPENDENCY_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        let (status, reason, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                None,
                "Authentication required".to_string(),
            ),
            AppError::NotAMember => (
                StatusCode::FORBIDDEN,
                Some("not_a_member"),
                "You are not a member of this thread".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, Some("forbidden"), msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Some("not_found"), msg),
            AppError::Validation { reason, message } => {
                (StatusCode::BAD_REQUEST, Some(reason), message)
            }
            AppError::Conflict { reason, message } => (StatusCode::CONFLICT, Some(reason), message),
            AppError::Expired { reason, message } => (StatusCode::CONFLICT, Some(reason), message),
            AppError::DependencyFailure(detail) => {
                tracing::error!("Dependency failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    None,
                    "A storage dependency failed".to_string(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                code,
                reason,
                message,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::DependencyFailure(err.to_string())
    }
}

impl From<ObjectStoreError> for AppError {
    fn from(err: ObjectStoreError) -> Self {
        AppError::DependencyFailure(err.to_string())
    }
}
