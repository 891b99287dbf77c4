//! Provider abstraction for outbound API authentication
//!
//! Defines the `Provider` trait that decouples the request client from the
//! authentication strategy. `StaticTokenProvider` injects a pre-issued bearer
//! token; the OAuth 2.0 provider (token lifecycle with refresh) implements the
//! same trait in the binary. A provider is selected once at startup from the
//! credentials that are available, and the posting and media layers only ever
//! see `Arc<dyn Provider>`.

pub mod static_token;

pub use static_token::StaticTokenProvider;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::future::Future;
use std::pin::Pin;

/// Errors from provider operations (token refresh, credential storage, etc.)
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Something that can authenticate an outbound request.
///
/// `prepare_request` receives the method and absolute URL so that signing
/// schemes that cover the request line can be implemented behind the same
/// interface as bearer tokens.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Provider>`).
pub trait Provider: Send + Sync {
    /// Identifier for logging and audit entries (e.g. "oauth2", "static")
    fn id(&self) -> &str;

    /// Insert the `Authorization` header (and anything else the scheme
    /// needs) for a request about to be sent.
    fn prepare_request<'a>(
        &'a self,
        method: &'a Method,
        url: &'a str,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Insert `Authorization: Bearer <token>`, replacing any existing value.
pub fn insert_bearer(headers: &mut HeaderMap, token: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ProviderError::Internal(format!("invalid token value: {e}")))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_bearer_replaces_existing_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic old"));
        insert_bearer(&mut headers, "at_123").unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer at_123");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn insert_bearer_rejects_control_characters() {
        let mut headers = HeaderMap::new();
        let result = insert_bearer(&mut headers, "bad\ntoken");
        assert!(matches!(result, Err(ProviderError::Internal(_))));
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        assert_eq!(
            ProviderError::Config("no credentials".into()).to_string(),
            "configuration error: no credentials"
        );
        assert!(
            ProviderError::Auth("token endpoint returned 400".into())
                .to_string()
                .contains("400")
        );
    }
}
