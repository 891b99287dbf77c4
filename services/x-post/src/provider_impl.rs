//! OAuth 2.0 provider and startup provider selection
//!
//! `OAuth2Provider` wraps the token lifecycle manager: every request asks it
//! for a usable access token, which may refresh and re-persist the token set
//! first. Selection happens once at startup from whatever credentials are
//! present, and nothing downstream knows which provider it got.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use provider::{Provider, ProviderError, StaticTokenProvider, insert_bearer};
use reqwest::Method;
use reqwest::header::HeaderMap;
use tracing::{debug, info};
use x_auth::{OAuthClient, TokenManager, TokenStore};

use crate::config::Config;

/// Provider backed by the refreshable OAuth 2.0 token set.
pub struct OAuth2Provider {
    manager: Arc<TokenManager>,
}

impl OAuth2Provider {
    pub fn new(manager: Arc<TokenManager>) -> Self {
        Self { manager }
    }
}

impl Provider for OAuth2Provider {
    fn id(&self) -> &str {
        "oauth2"
    }

    fn prepare_request<'a>(
        &'a self,
        method: &'a Method,
        url: &'a str,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let token = self.manager.get_access_token().await.map_err(map_auth_error)?;
            debug!(%method, url, "injecting oauth2 bearer token");
            insert_bearer(headers, &token)
        })
    }
}

fn map_auth_error(err: x_auth::Error) -> ProviderError {
    match err {
        x_auth::Error::Config(msg) => ProviderError::Config(msg),
        x_auth::Error::Storage(msg) => ProviderError::Internal(format!("token storage: {msg}")),
        other => ProviderError::Auth(other.to_string()),
    }
}

/// Build the token manager from OAuth client credentials.
///
/// Fails with `MissingEnv` when the client id or secret is absent.
pub fn token_manager(config: &Config, http: &reqwest::Client) -> common::Result<TokenManager> {
    let creds = &config.credentials;
    let client_id = creds
        .client_id
        .clone()
        .ok_or_else(|| common::Error::MissingEnv("X_OAUTH2_CLIENT_ID".into()))?;
    let client_secret = creds
        .client_secret
        .clone()
        .ok_or_else(|| common::Error::MissingEnv("X_OAUTH2_CLIENT_SECRET".into()))?;

    let client = OAuthClient::new(client_id, client_secret)
        .with_token_endpoint(&config.endpoints.token_url)
        .with_authorize_endpoint(&config.endpoints.authorize_url)
        .with_redirect_uri(&config.oauth.redirect_uri);

    Ok(TokenManager::new(
        TokenStore::new(&config.storage.token_file),
        http.clone(),
        client,
    )
    .with_refresh_token(creds.refresh_token.clone())
    .with_margin(config.refresh_margin()))
}

/// Pick the provider for this invocation.
///
/// OAuth 2.0 when client id and secret are both set, otherwise a static
/// bearer token when one is supplied, otherwise a configuration error
/// before any network activity.
pub fn select_provider(config: &Config, http: &reqwest::Client) -> common::Result<Arc<dyn Provider>> {
    let creds = &config.credentials;
    if creds.client_id.is_some() && creds.client_secret.is_some() {
        let manager = token_manager(config, http)?;
        info!(token_file = %config.storage.token_file.display(), "using OAuth 2.0 credentials");
        return Ok(Arc::new(OAuth2Provider::new(Arc::new(manager))));
    }
    if let Some(token) = &creds.access_token {
        info!("using static bearer token");
        return Ok(Arc::new(StaticTokenProvider::new(token.clone())));
    }
    Err(common::Error::Config(
        "no credentials: set X_OAUTH2_CLIENT_ID and X_OAUTH2_CLIENT_SECRET, or X_OAUTH2_ACCESS_TOKEN"
            .into(),
    ))
}
