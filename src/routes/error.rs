//! Errors surfaced by the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid kind '{0}' (expected 'entries' or 'summaries')")]
    InvalidKind(String),

    #[error("Either 'filename' or 'name' is required")]
    MissingName,

    #[error("{0}")]
    InvalidInput(String),

    #[error("File not found")]
    NotFound,

    /// Backend details stay in the logs
    #[error("Storage failure")]
    Storage,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidCollection(kind) => ApiError::InvalidKind(kind),
            StorageError::InvalidPath { .. } => ApiError::InvalidInput(err.to_string()),
            StorageError::NotFound { .. } => ApiError::NotFound,
            StorageError::Backend { .. } => {
                error!("Storage operation failed: {:#}", anyhow::Error::from(err));
                ApiError::Storage
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let (status, code) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::InvalidKind(_) => (StatusCode::BAD_REQUEST, "INVALID_KIND"),
            ApiError::MissingName => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_NAME"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE"),
        };

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
