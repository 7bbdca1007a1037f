//! JSON error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::TrackerError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &TrackerError) -> StatusCode {
    match err {
        TrackerError::Validation { .. } => StatusCode::BAD_REQUEST,
        TrackerError::Conflict { .. } => StatusCode::CONFLICT,
        TrackerError::NotFound { .. } => StatusCode::NOT_FOUND,
        TrackerError::ConfigParse { .. }
        | TrackerError::ConfigMissing { .. }
        | TrackerError::ConfigInvalid { .. }
        | TrackerError::Database { .. }
        | TrackerError::DatabaseQuery { .. }
        | TrackerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TrackerError> for WebError {
    fn from(err: TrackerError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<axum_login::Error<super::Backend>> for WebError {
    fn from(err: axum_login::Error<super::Backend>) -> Self {
        match err {
            axum_login::Error::Backend(inner) => inner.into(),
            axum_login::Error::Session(inner) => {
                tracing::error!(error = %inner, "session store failure");
                Self::internal(inner.to_string())
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
