//! In-process X API and test providers

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::Secret;
use provider::{Provider, ProviderError, StaticTokenProvider, insert_bearer};
use reqwest::Method;
use reqwest::header::HeaderMap;
use tokio::net::TcpListener;

use crate::request::{ApiClient, ApiEndpoints};

/// One request as the mock received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

struct Canned {
    status: StatusCode,
    content_type: String,
    body: String,
}

#[derive(Default)]
struct ApiState {
    routes: Mutex<HashMap<(String, String), Canned>>,
    requests: Mutex<Vec<Recorded>>,
}

/// Serves canned responses keyed by method and path, records everything,
/// and answers 404 for anything not registered.
pub struct MockApi {
    base: String,
    state: Arc<ApiState>,
    _server: tokio::task::JoinHandle<()>,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(ApiState::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base: format!("http://{addr}"),
            state,
            _server: server,
        }
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, content_type: &str, body: &str) {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            Canned {
                status: StatusCode::from_u16(status).unwrap(),
                content_type: content_type.to_string(),
                body: body.to_string(),
            },
        );
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Endpoints rooted at this server: API base `/2`, upload at `/upload`.
    pub fn endpoints(&self) -> ApiEndpoints {
        ApiEndpoints {
            api_base: format!("{}/2", self.base),
            upload_url: format!("{}/upload", self.base),
        }
    }
}

async fn handle(State(state): State<Arc<ApiState>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap().to_vec();
    let headers = parts
        .headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let key = (parts.method.to_string(), parts.uri.path().to_string());
    state.requests.lock().unwrap().push(Recorded {
        method: key.0.clone(),
        path: key.1.clone(),
        query: parts.uri.query().map(str::to_owned),
        headers,
        body,
    });

    let routes = state.routes.lock().unwrap();
    match routes.get(&key) {
        Some(canned) => (
            canned.status,
            [
                (header::CONTENT_TYPE, canned.content_type.clone()),
                (
                    header::HeaderName::from_static("x-rate-limit-remaining"),
                    "99".to_string(),
                ),
            ],
            canned.body.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no route").into_response(),
    }
}

/// Client against `api` with a fixed bearer token.
pub fn static_client(api: &MockApi, token: &str) -> ApiClient {
    ApiClient::new(
        reqwest::Client::new(),
        Arc::new(StaticTokenProvider::new(Secret::new(token.to_string()))),
        api.endpoints(),
    )
}

/// Bearer provider that counts how often it was asked for credentials.
#[derive(Default)]
pub struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for CountingProvider {
    fn id(&self) -> &str {
        "counting"
    }

    fn prepare_request<'a>(
        &'a self,
        _method: &'a Method,
        _url: &'a str,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            insert_bearer(headers, &format!("at_{n}"))
        })
    }
}

/// Provider whose credentials are never available.
pub struct FailingProvider;

impl Provider for FailingProvider {
    fn id(&self) -> &str {
        "failing"
    }

    fn prepare_request<'a>(
        &'a self,
        _method: &'a Method,
        _url: &'a str,
        _headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + 'a>> {
        Box::pin(async { Err(ProviderError::Auth("refresh token revoked".into())) })
    }
}
