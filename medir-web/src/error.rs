//! Error types for medir-web

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Handler error type
#[derive(Debug, Error)]
pub enum WebError {
    /// Page template failed to render (500)
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// medir-common error
    #[error(transparent)]
    Common(#[from] medir_common::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            WebError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ERROR"),
            WebError::Common(medir_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            WebError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for handlers
pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let error = WebError::from(medir_common::Error::InvalidInput("Doctor name cannot be empty".to_string()));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let error = WebError::from(medir_common::Error::Internal("pool closed".to_string()));
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
