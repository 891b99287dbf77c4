//! Error types for OAuth operations

/// Errors from OAuth authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx from the token endpoint. `body` is already bounded.
    #[error("token endpoint returned {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("token storage error: {0}")]
    Storage(String),

    #[error("invalid callback: {0}")]
    Callback(String),

    #[error("state parameter in callback does not match the authorization request")]
    StateMismatch,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_carries_status_and_body() {
        let err = Error::Auth {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("invalid_grant"), "got: {msg}");
    }

    #[test]
    fn error_debug_includes_variant_name() {
        let err = Error::Storage("disk full".into());
        assert!(format!("{err:?}").contains("Storage"));
    }
}
