//! Error types for the Graph API client.

use thiserror::Error;

/// Errors that can occur when querying the Graph API.
#[derive(Debug, Error)]
pub enum AdsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API.
    #[error("Graph API error {status}: {body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, AdsError>;
