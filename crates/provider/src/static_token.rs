//! Static token provider: injects a pre-issued bearer token.
//!
//! Used when no OAuth 2.0 client credentials are configured but an access
//! token was supplied directly. There is no refresh: once the token expires,
//! every request fails with 401 and the operator has to supply a new one.

use crate::{Provider, insert_bearer};
use common::Secret;
use reqwest::Method;
use reqwest::header::HeaderMap;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Bearer provider with a fixed token and no lifecycle management.
pub struct StaticTokenProvider {
    token: Secret<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

impl Provider for StaticTokenProvider {
    fn id(&self) -> &str {
        "static"
    }

    fn prepare_request<'a>(
        &'a self,
        method: &'a Method,
        url: &'a str,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = crate::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            debug!(%method, url, "injecting static bearer token");
            insert_bearer(headers, self.token.expose())
        })
    }
}
