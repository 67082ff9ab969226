use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Entry not found")]
    NotFound,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Operation timed out")]
    Timeout,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedInput(_) | AppError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::StorageUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::StorageUnavailable(_) => error!("{self}"),
            AppError::Timeout => warn!("{self}"),
            _ => debug!("Rejected request: {self}"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failures that stop the server from starting or keep it from serving.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid {key} value: {message}")]
    Config { key: &'static str, message: String },

    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::MalformedInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ValidationFailure("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::StorageUnavailable("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "Entry not found");
    }
}
