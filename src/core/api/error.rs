//! Errors raised by the backend API client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response. `body` is the raw response text, kept verbatim.
    #[error("{status} {status_text}: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Error carried inside a 2xx envelope.
    #[error("{code}: {message}")]
    Application { code: String, message: String },
}

impl ApiError {
    /// HTTP status for transport failures, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
