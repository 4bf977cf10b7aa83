//! Error types for the relay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Kommo API error.
    #[error("Kommo API error: {0}")]
    Kommo(#[from] kommo::KommoError),

    /// Malformed client request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::tokens::TokenError> for RelayError {
    fn from(err: crate::tokens::TokenError) -> Self {
        match err {
            crate::tokens::TokenError::Database(e) => RelayError::Database(e),
            crate::tokens::TokenError::Refresh(e) => RelayError::Kommo(e),
            other => RelayError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            RelayError::Kommo(err) => {
                tracing::error!("Kommo API error: {}", err);
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            RelayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RelayError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for relay handlers.
pub type Result<T> = std::result::Result<T, RelayError>;
