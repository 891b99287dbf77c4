//! In-process stand-in for the token, API, and upload endpoints

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

use crate::config::Config;

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<HashMap<(String, String), (StatusCode, String)>>,
    hits: Mutex<Vec<Hit>>,
}

/// Answers registered `(method, path)` pairs with canned JSON, 404 otherwise.
pub struct MockServer {
    base: String,
    state: Arc<ServerState>,
    _server: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
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

    pub fn respond(&self, method: &str, path: &str, status: u16, json: &str) {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (StatusCode::from_u16(status).unwrap(), json.to_string()),
        );
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hits_to(&self, path: &str) -> usize {
        self.hits().iter().filter(|h| h.path == path).count()
    }

    /// Point every endpoint in `config` at this server.
    pub fn apply_to(&self, config: &mut Config) {
        config.endpoints.token_url = format!("{}/2/oauth2/token", self.base);
        config.endpoints.api_base = format!("{}/2", self.base);
        config.endpoints.upload_url = format!("{}/upload", self.base);
    }
}

async fn handle(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap().to_vec();
    let key = (parts.method.to_string(), parts.uri.path().to_string());
    state.hits.lock().unwrap().push(Hit {
        method: key.0.clone(),
        path: key.1.clone(),
        body,
    });

    let routes = state.routes.lock().unwrap();
    match routes.get(&key) {
        Some((status, json)) => (
            *status,
            [(header::CONTENT_TYPE, "application/json")],
            json.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no route").into_response(),
    }
}
