//! In-process token endpoint for tests

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the mock saw on its most recent call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub form: String,
    pub authorization: Option<String>,
}

struct MockState {
    status: StatusCode,
    body: String,
    calls: AtomicUsize,
    last: Mutex<Option<RecordedRequest>>,
}

/// Token endpoint that answers every POST with a fixed status and body
/// and counts how often it was hit.
pub struct MockTokenEndpoint {
    pub url: String,
    state: Arc<MockState>,
    _server: tokio::task::JoinHandle<()>,
}

impl MockTokenEndpoint {
    pub async fn start(status: u16, body: &str) -> Self {
        let state = Arc::new(MockState {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/2/oauth2/token", post(handle_token))
            .with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{addr}/2/oauth2/token"),
            state,
            _server: server,
        }
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.last.lock().unwrap().clone()
    }
}

async fn handle_token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.last.lock().unwrap() = Some(RecordedRequest {
        form: body,
        authorization,
    });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}
