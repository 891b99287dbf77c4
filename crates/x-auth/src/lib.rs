//! X OAuth 2.0 authentication library
//!
//! PKCE generation, authorization URL construction, callback parsing, token
//! exchange/refresh, token file storage, and the lifecycle manager that turns
//! all of it into "give me a usable access token". This crate has no
//! dependency on the CLI and can be tested on its own.
//!
//! Credential flow:
//! 1. `AuthorizationRequest::new()` generates PKCE pair + state + URL
//! 2. User authorizes in a browser and pastes the redirect back
//! 3. `parse_callback()` + `verify_state()` extract the code
//! 4. `TokenManager::exchange_authorization_code()` swaps it for tokens
//! 5. `TokenSet::from_exchange()` + `TokenStore::save()` persist them
//! 6. Every API call goes through `TokenManager::get_access_token()`, which
//!    refreshes and re-persists when the stored token nears expiry

pub mod callback;
pub mod client;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod pkce;
pub mod store;
pub mod token;

#[cfg(test)]
mod test_support;

pub use callback::{CallbackParams, parse_callback, verify_state};
pub use client::OAuthClient;
pub use constants::*;
pub use error::{Error, Result};
pub use lifecycle::{TokenManager, TokenState};
pub use pkce::{
    AuthorizationRequest, PkceChallenge, build_authorization_url, derive_challenge,
    generate_state, generate_verifier,
};
pub use store::{TokenSet, TokenStore, now_millis};
pub use token::{TokenResponse, exchange_code, refresh_token};
