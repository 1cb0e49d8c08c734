//! API error taxonomy and its JSON rendering.

use crate::models::MessageRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use stash_core::{FilesError, Forbidden};

pub(crate) const MSG_FORBIDDEN: &str = "Invalid accessCode or collisionString";
pub(crate) const MSG_INVALID_FILENAME: &str = "Invalid filename";

/// Every failure a handler can report.
///
/// Rendered as `{"message": ...}` with the matching status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Forbidden,
    NotFound(String),
    Conflict(String),
    MethodNotAllowed(&'static str),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_filename() -> Self {
        ApiError::BadRequest(MSG_INVALID_FILENAME.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Forbidden => MSG_FORBIDDEN.to_string(),
            ApiError::MethodNotAllowed(method) => format!("Only {method} method is allowed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageRes::new(self.message()))).into_response()
    }
}

impl From<Forbidden> for ApiError {
    fn from(_: Forbidden) -> Self {
        ApiError::Forbidden
    }
}

impl From<FilesError> for ApiError {
    fn from(error: FilesError) -> Self {
        match error {
            FilesError::FileNotFound(_) => ApiError::NotFound("File does not exist".into()),
            FilesError::NamespaceNotFound(_) => {
                ApiError::NotFound("Directory does not exist".into())
            }
            FilesError::AlreadyExists(_) => {
                ApiError::Conflict("New file name already exists".into())
            }
            other => {
                tracing::error!("File operation error: {:?}", other);
                let message = match other {
                    FilesError::DirCreation(_) => "Failed to create directory",
                    FilesError::DirRecreation(_) => "Failed to recreate directory",
                    FilesError::Write(_) => "Failed to save file",
                    FilesError::ReadDir(_) => "Failed to read directory",
                    FilesError::Rename(_) => "Failed to rename file",
                    FilesError::Remove(_) => "Failed to delete file",
                    FilesError::Clear(_) => "Failed to clear files",
                    _ => "Internal error",
                };
                ApiError::Internal(message.into())
            }
        }
    }
}
