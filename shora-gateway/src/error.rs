//! Gateway error types.
//!
//! Every backend failure is normalised into one of these variants; callers turn them into fixed user-facing text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection refused, reset or timed out.
    #[error("Backend unavailable, the server may be asleep or not started. URL: {url}")]
    Unavailable { url: String },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl GatewayError {
    /// Maps a transport error, naming `base_url` when the backend cannot be reached.
    pub fn from_reqwest(err: reqwest::Error, base_url: &str) -> Self {
        if err.is_connect() || err.is_timeout() {
            GatewayError::Unavailable {
                url: base_url.to_string(),
            }
        } else if err.is_decode() {
            GatewayError::Malformed(err.to_string())
        } else {
            GatewayError::Request(err.to_string())
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, GatewayError::Unavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
