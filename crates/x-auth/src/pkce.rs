//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! A verifier/challenge pair lives for exactly one authorization attempt.
//! The challenge goes into the authorization URL; the verifier stays in
//! process memory and is sent to the token endpoint once, at code exchange.
//! Neither is ever persisted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Secret;
use rand::RngExt;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::client::OAuthClient;
use crate::constants::{CODE_CHALLENGE_METHOD, SCOPES};
use crate::error::{Error, Result};

/// Bytes of randomness behind verifiers and state values (256 bits).
const RANDOM_BYTES: usize = 32;

/// Generate a cryptographically random PKCE code verifier.
///
/// 32 random bytes encoded as URL-safe base64 without padding: 43
/// characters, the RFC 7636 minimum length, carrying 256 bits of entropy.
pub fn generate_verifier() -> String {
    random_token()
}

/// Derive the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(ASCII(verifier)))`
pub fn derive_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate an anti-CSRF `state` value with the same entropy as a verifier.
pub fn generate_state() -> String {
    random_token()
}

fn random_token() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Verifier and challenge for one authorization attempt.
pub struct PkceChallenge {
    verifier: Secret<String>,
    challenge: String,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = derive_challenge(&verifier);
        Self {
            verifier: Secret::new(verifier),
            challenge,
        }
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Consume the pair, keeping only the verifier for the code exchange.
    pub fn into_verifier(self) -> Secret<String> {
        self.verifier
    }
}

/// Everything produced when starting an authorization attempt.
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub pkce: PkceChallenge,
}

impl AuthorizationRequest {
    /// Start a new attempt: fresh PKCE pair, fresh state, full URL.
    pub fn new(client: &OAuthClient) -> Result<Self> {
        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let url = build_authorization_url(client, &state, pkce.challenge())?;
        Ok(Self { url, state, pkce })
    }
}

/// Build the authorization URL with all required OAuth parameters.
///
/// Parameter values are form-urlencoded, so the space-joined scope list
/// appears with `+` separators.
pub fn build_authorization_url(client: &OAuthClient, state: &str, challenge: &str) -> Result<String> {
    let scope = SCOPES.join(" ");
    let url = Url::parse_with_params(
        &client.authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", challenge),
            ("code_challenge_method", CODE_CHALLENGE_METHOD),
        ],
    )
    .map_err(|e| {
        Error::Config(format!(
            "invalid authorize endpoint {}: {e}",
            client.authorize_endpoint
        ))
    })?;
    Ok(url.into())
}
