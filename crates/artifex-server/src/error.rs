use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use artifex_service::ServiceError;

/// Errors starting or configuring the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] artifex_store::StoreError),

    #[error("overlay error: {0}")]
    Overlay(#[from] artifex_overlay::OverlayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A JSON error response: `{"error": ...}` plus `details` on 500s.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    pub fn with_status(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, error)
    }

    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
            details: Some(details.into()),
        }
    }

    /// Map a service error. `failure` is the headline used for processing
    /// errors, e.g. `"Error annotating image"`.
    pub fn from_service(err: ServiceError, failure: &str) -> Self {
        if let Some(kind) = err.empty_catalog() {
            return Self::not_found(kind.message());
        }
        match err {
            ServiceError::Input(msg) => Self::bad_request(msg),
            ServiceError::NotFound(_) => Self::not_found("Image not found"),
            other => {
                tracing::error!(error = %other, "{failure}");
                Self::internal(failure, other.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
