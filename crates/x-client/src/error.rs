//! Error types for API client operations

use provider::ProviderError;

/// Errors from API client operations.
///
/// Status-carrying variants hold an already bounded body excerpt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] ProviderError),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("unsupported media type: {0} (supported: .png, .jpg, .jpeg, .gif, .webp, .mp4)")]
    UnsupportedMedia(String),

    #[error("media file too large: {size} bytes (max {max} bytes)")]
    MediaTooLarge { size: u64, max: u64 },

    #[error("media upload failed: HTTP {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("request failed: HTTP {status}: {body}")]
    Request { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
