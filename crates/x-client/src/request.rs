//! Authenticated request client
//!
//! Every request asks the provider for credentials first (which may trigger
//! a token refresh), then goes out with the fixed client identifier. Non-2xx
//! responses are returned, not raised: the uniform `ApiResponse` carries the
//! status and an `ok` flag and each caller decides what a failure means.

use std::collections::HashMap;
use std::sync::Arc;

use provider::Provider;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Base URL for v2 REST resources.
pub const API_BASE: &str = "https://api.x.com/2";

/// Media upload endpoint (separate host, v1.1).
pub const UPLOAD_ENDPOINT: &str = "https://upload.twitter.com/1.1/media/upload.json";

/// Client identifier sent with every request.
pub const USER_AGENT: &str = concat!("x-post/", env!("CARGO_PKG_VERSION"));

/// Resource and upload endpoints. Overridable for staging and tests.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub api_base: String,
    pub upload_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            upload_url: UPLOAD_ENDPOINT.to_string(),
        }
    }
}

/// Response body, parsed as JSON when the server said it was JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    /// Full body as text (JSON re-serialized).
    pub fn to_text(&self) -> String {
        match self {
            Payload::Json(v) => v.to_string(),
            Payload::Text(t) => t.clone(),
        }
    }

    /// Bounded body text for errors and logs.
    pub fn excerpt(&self) -> String {
        common::excerpt(&self.to_text())
    }
}

/// Uniform result of an API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub ok: bool,
    pub data: Payload,
    pub headers: HashMap<String, String>,
}

/// HTTP client that authenticates every request through a `Provider`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    provider: Arc<dyn Provider>,
    endpoints: ApiEndpoints,
    user_agent: String,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, provider: Arc<dyn Provider>, endpoints: ApiEndpoints) -> Self {
        Self {
            http,
            provider,
            endpoints,
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Id of the provider in use ("oauth2", "static"), for audit entries.
    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Absolute URL for a path under the API base (`/users/me`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.api_base.trim_end_matches('/'), path)
    }

    /// Send an authenticated request with an optional JSON body.
    ///
    /// The body is ignored for GET and HEAD.
    pub async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let json = body.filter(|_| method != Method::GET && method != Method::HEAD);
        self.execute(method, url, HeaderMap::new(), |req| match json {
            Some(b) => req.json(b),
            None => req,
        })
        .await
    }

    /// Send an authenticated request with a raw body and explicit content type.
    pub async fn send_bytes(
        &self,
        method: Method,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<ApiResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .map_err(|e| Error::Http(format!("invalid content type {content_type:?}: {e}")))?,
        );
        self.execute(method, url, headers, |req| req.body(body)).await
    }

    #[instrument(skip_all, fields(method = %method, url = %url, provider = self.provider.id()))]
    async fn execute(
        &self,
        method: Method,
        url: &str,
        mut headers: HeaderMap,
        attach_body: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<ApiResponse> {
        self.provider.prepare_request(&method, url, &mut headers).await?;
        headers.insert(
            USER_AGENT_HEADER,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| Error::Http(format!("invalid user agent: {e}")))?,
        );

        let request = attach_body(self.http.request(method, url).headers(headers));
        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {e}")))?;

        let status = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        let is_json = headers
            .get("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {e}")))?;

        let data = if is_json {
            match serde_json::from_str(&text) {
                Ok(v) => Payload::Json(v),
                Err(e) => {
                    debug!(error = %e, "response declared JSON but did not parse, keeping text");
                    Payload::Text(text)
                }
            }
        } else {
            Payload::Text(text)
        };

        debug!(status = status.as_u16(), "response received");
        Ok(ApiResponse {
            status: status.as_u16(),
            ok: status.is_success(),
            data,
            headers,
        })
    }
}
