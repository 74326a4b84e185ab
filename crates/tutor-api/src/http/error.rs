//! Application error type mapping to HTTP status codes and envelope format.

use axum::response::{IntoResponse, Response};

use tutor_types::error::ArchiveError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Archive(ArchiveError),
    /// The request body is unusable.
    Validation(String),
}

impl From<ArchiveError> for AppError {
    fn from(e: ArchiveError) -> Self {
        AppError::Archive(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Archive(e) => {
                tracing::error!(error = %e, "archive error while serving request");
                ("ARCHIVE_ERROR", e.to_string())
            }
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
        };

        ApiResponse::error(code, &message, String::new(), 0).into_response()
    }
}
