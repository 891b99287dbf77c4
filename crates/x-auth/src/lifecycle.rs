//! Token lifecycle state machine
//!
//! States over the one persisted token set:
//! - `NoToken`: no usable file (before first authorization, or corrupt)
//! - `Valid`: access token good for longer than the refresh margin
//! - `ExpiredOrExpiring`: access token expired or inside the margin
//!
//! `get_access_token` returns a stored `Valid` token without touching the
//! network or the disk (beyond the read). Anything else goes through one
//! refresh exchange, persists the result, and returns the new token. A failed
//! refresh never writes: the previous refresh token stays on disk for the
//! next attempt. Nothing here retries.

use std::time::Duration;

use common::Secret;
use tracing::{debug, info, warn};

use crate::client::OAuthClient;
use crate::constants::REFRESH_MARGIN;
use crate::error::{Error, Result};
use crate::store::{TokenSet, TokenStore, now_millis};
use crate::token::{self, TokenResponse};

/// Where the stored token set sits in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Valid { remaining: Duration },
    ExpiredOrExpiring,
}

impl TokenState {
    /// Classify a (possibly absent) token set at `now_millis`.
    pub fn classify(tokens: Option<&TokenSet>, margin: Duration, now_millis: u64) -> Self {
        let Some(tokens) = tokens else {
            return TokenState::NoToken;
        };
        let margin_millis = margin.as_millis() as u64;
        if !tokens.access_token.is_empty()
            && tokens.expires_at > now_millis.saturating_add(margin_millis)
        {
            TokenState::Valid {
                remaining: Duration::from_millis(tokens.remaining_millis(now_millis)),
            }
        } else {
            TokenState::ExpiredOrExpiring
        }
    }

    /// Status label for logging and `x-post status`.
    pub fn label(&self) -> &'static str {
        match self {
            TokenState::NoToken => "no_token",
            TokenState::Valid { .. } => "valid",
            TokenState::ExpiredOrExpiring => "expired_or_expiring",
        }
    }
}

/// Hands out usable access tokens, refreshing through the token endpoint
/// when the stored one is missing or about to expire.
pub struct TokenManager {
    store: TokenStore,
    http: reqwest::Client,
    client: OAuthClient,
    configured_refresh: Option<Secret<String>>,
    margin: Duration,
}

impl TokenManager {
    pub fn new(store: TokenStore, http: reqwest::Client, client: OAuthClient) -> Self {
        Self {
            store,
            http,
            client,
            configured_refresh: None,
            margin: REFRESH_MARGIN,
        }
    }

    /// Refresh token supplied out-of-band (environment). Only used when the
    /// store has none, e.g. on a fresh machine.
    pub fn with_refresh_token(mut self, refresh: Option<Secret<String>>) -> Self {
        self.configured_refresh = refresh;
        self
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Current lifecycle state, without any network call.
    pub async fn status(&self) -> TokenState {
        let current = self.store.load().await;
        TokenState::classify(current.as_ref(), self.margin, now_millis())
    }

    /// Return an access token valid for at least the refresh margin.
    pub async fn get_access_token(&self) -> Result<String> {
        let current = self.store.load().await;
        let state = TokenState::classify(current.as_ref(), self.margin, now_millis());
        if let (TokenState::Valid { remaining }, Some(tokens)) = (&state, &current) {
            debug!(remaining_secs = remaining.as_secs(), "stored access token valid");
            return Ok(tokens.access_token.clone());
        }

        debug!(state = state.label(), "access token needs refresh");
        let refreshed = self.refresh(current).await?;
        Ok(refreshed.access_token)
    }

    /// Refresh regardless of the stored token's expiry.
    pub async fn force_refresh(&self) -> Result<TokenSet> {
        let current = self.store.load().await;
        self.refresh(current).await
    }

    /// Exchange an authorization code (interactive setup only).
    ///
    /// Returns the raw response; persisting it is the caller's decision so a
    /// failed or partial exchange never touches the store.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        verifier: &Secret<String>,
    ) -> Result<TokenResponse> {
        let response = token::exchange_code(&self.http, &self.client, code, verifier.expose()).await?;
        info!(
            expires_in = response.expires_in,
            scope = %response.scope,
            "authorization code exchanged"
        );
        Ok(response)
    }

    async fn refresh(&self, current: Option<TokenSet>) -> Result<TokenSet> {
        let refresh = self.refresh_token_for(current.as_ref())?;

        let response = match token::refresh_token(&self.http, &self.client, &refresh).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "token refresh failed, stored tokens left unchanged");
                return Err(e);
            }
        };

        let rotated = response.refresh_token.as_deref().is_some_and(|t| !t.is_empty());
        let expires_in = response.expires_in;
        let tokens = TokenSet::from_refresh(response, &refresh, now_millis());

        self.store.save(&tokens).await?;
        info!(expires_in, rotated, "access token refreshed");
        Ok(tokens)
    }

    /// Stored refresh token first (it reflects any rotation), then the
    /// configured one.
    fn refresh_token_for(&self, current: Option<&TokenSet>) -> Result<String> {
        if let Some(stored) = current.map(|t| &t.refresh_token).filter(|t| !t.is_empty()) {
            return Ok(stored.clone());
        }
        self.configured_refresh
            .as_ref()
            .map(|s| s.expose().clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "no refresh token: {} has none and X_OAUTH2_REFRESH_TOKEN is not set (run `x-post authorize`)",
                    self.store.path().display()
                ))
            })
    }
}
