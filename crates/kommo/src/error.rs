//! Error types for the Kommo client.

use thiserror::Error;

/// Errors that can occur when interacting with the Kommo API.
#[derive(Debug, Error)]
pub enum KommoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API.
    #[error("Kommo API error {status}: {body}")]
    Api { status: u16, body: String },

    /// OAuth token exchange or refresh rejected.
    #[error("Token request failed with status {status}: {body}")]
    Token { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, KommoError>;
