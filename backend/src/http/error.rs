//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::AnalyticsError;

/// Body returned for every failed request.
const FETCH_FAILED: &str = "failed to fetch analytics";

/// API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Resource not found
    NotFound(String),
    /// Repository error; the cause is logged, not returned
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Repository(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, e.message().to_string())
            }
            AppError::Repository(e) => {
                tracing::error!(error = %e, "repository error");
                (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED.to_string())
            }
        };

        (status, Json(ApiError::new(message))).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidInput(msg) => AppError::BadRequest(msg),
            AnalyticsError::Repository(e) => AppError::Repository(e),
        }
    }
}
