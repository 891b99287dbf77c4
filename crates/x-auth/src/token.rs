//! Token endpoint calls
//!
//! - `exchange_code`: authorization code + PKCE verifier, once per `authorize`
//! - `refresh_token`: refresh grant, whenever the stored token nears expiry
//!
//! Both are form POSTs authenticated with HTTP Basic (client id and secret).

use common::excerpt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::OAuthClient;
use crate::constants::DEFAULT_TOKEN_TYPE;
use crate::error::{Error, Result};

/// Token endpoint success body, shared by both grants.
///
/// `refresh_token` is missing when a refresh did not rotate it, or when an
/// exchange was granted without `offline.access`.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Relative seconds; `TokenSet` stores an absolute deadline
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

/// Exchange an authorization code for tokens (initial OAuth flow).
///
/// Sends the PKCE verifier, never the challenge: the provider hashes it and
/// compares against the challenge it saw in the authorization URL.
pub async fn exchange_code(
    http: &reqwest::Client,
    client: &OAuthClient,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    post_token_form(
        http,
        client,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ],
    )
    .await
}

/// Refresh an access token using a refresh token.
pub async fn refresh_token(
    http: &reqwest::Client,
    client: &OAuthClient,
    refresh: &str,
) -> Result<TokenResponse> {
    post_token_form(
        http,
        client,
        &[("grant_type", "refresh_token"), ("refresh_token", refresh)],
    )
    .await
}

async fn post_token_form(
    http: &reqwest::Client,
    client: &OAuthClient,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    let grant_type = form
        .iter()
        .find(|(k, _)| *k == "grant_type")
        .map(|(_, v)| *v)
        .unwrap_or("unknown");
    debug!(grant_type, endpoint = %client.token_endpoint, "calling token endpoint");

    let response = http
        .post(&client.token_endpoint)
        .basic_auth(&client.client_id, Some(client.client_secret.expose()))
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("{grant_type} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Auth {
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading {grant_type} response: {e}")))?;

    serde_json::from_str::<TokenResponse>(&body).map_err(|e| {
        Error::Protocol(format!(
            "invalid {grant_type} response ({e}): {}",
            excerpt(&body)
        ))
    })
}
