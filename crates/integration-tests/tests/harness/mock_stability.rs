//! Mock Stability AI backend for integration tests
//!
//! Serves the v1 text-to-image route for any engine and answers with a
//! configurable status and body

use std::net::SocketAddr;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub engine: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub body: serde_json::Value,
}

/// Mock backend that returns a fixed response
pub struct MockStability {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    status: StatusCode,
    body: serde_json::Value,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockStability {
    /// Start a mock that returns one artifact with base64 `AAAA`
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(
            StatusCode::OK,
            serde_json::json!({
                "artifacts": [{ "base64": "AAAA", "seed": 1234, "finishReason": "SUCCESS" }]
            }),
        )
        .await
    }

    /// Start a mock that always answers with `status` and `body`
    pub async fn start_with(status: StatusCode, body: serde_json::Value) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            status,
            body,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/generation/{engine}/text-to-image", routing::post(handle_text_to_image))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as the provider
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of text-to-image requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().expect("mock state lock").last().cloned()
    }
}

impl Drop for MockStability {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_text_to_image(
    State(state): State<Arc<MockState>>,
    Path(engine): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);

    state.requests.lock().expect("mock state lock").push(RecordedRequest {
        engine,
        authorization: header("authorization"),
        accept: header("accept"),
        body,
    });

    (state.status, Json(state.body.clone()))
}
