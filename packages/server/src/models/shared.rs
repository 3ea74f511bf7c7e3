use serde::Serialize;

use crate::error::AppError;

/// Bare acknowledgement for write actions without a payload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    #[schema(example = true)]
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("missing_title", "Title must not be empty"));
    }
    if title.chars().count() > 256 {
        return Err(AppError::validation(
            "title_too_long",
            "Title must be 1-256 characters",
        ));
    }
    Ok(())
}
