//! OAuth client registration: who we are and where the provider lives.

use common::Secret;

use crate::constants::{AUTHORIZE_ENDPOINT, REDIRECT_URI, TOKEN_ENDPOINT};

/// Client credentials plus the endpoints they are used against.
///
/// The secret is only ever sent to the token endpoint, as HTTP Basic
/// authentication together with the client id.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub authorize_endpoint: String,
    pub token_endpoint: String,
    pub redirect_uri: String,
}

impl OAuthClient {
    /// Client using the provider's fixed endpoints and redirect URI.
    pub fn new(client_id: impl Into<String>, client_secret: Secret<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            authorize_endpoint: AUTHORIZE_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
        }
    }

    pub fn with_token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.token_endpoint = url.into();
        self
    }

    pub fn with_authorize_endpoint(mut self, url: impl Into<String>) -> Self {
        self.authorize_endpoint = url.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }
}
