//! Fake review API and chat API servers shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use hwbot_orchestrator::{Config, Credentials};
use serde_json::Value;

/// Helper to find an available port for testing.
pub fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Serves `router` on an ephemeral port and returns its base URL.
async fn spawn_server(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    (format!("http://{addr}"), handle)
}

// ============================================================================
// Review API
// ============================================================================

/// A canned answer of the fake review API.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    /// A 200 reply with a JSON body.
    pub fn json(body: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// A 200 reply listing a single homework.
    pub fn homework(name: &str, status: &str) -> Self {
        Self::json(&serde_json::json!({
            "homeworks": [{"homework_name": name, "status": status}],
            "current_date": 1_700_000_000
        }))
    }

    /// A reply with an arbitrary status and raw body.
    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Delays the reply.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// What the fake review API saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub authorization: Option<String>,
    pub from_date: Option<String>,
}

#[derive(Clone, Default)]
struct ReviewApiState {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Handle to a running fake review API.
pub struct FakeReviewApi {
    pub endpoint: String,
    state: ReviewApiState,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeReviewApi {
    /// Starts a server replaying `replies` in order, then answering 404.
    pub async fn start(replies: Vec<Reply>) -> Self {
        let state = ReviewApiState {
            replies: Arc::new(Mutex::new(replies.into())),
            seen: Arc::default(),
        };
        let router = Router::new()
            .route("/api/user_api/homework_statuses/", get(homework_statuses))
            .with_state(state.clone());
        let (base, handle) = spawn_server(router).await;

        Self {
            endpoint: format!("{base}/api/user_api/homework_statuses/"),
            state,
            _handle: handle,
        }
    }

    /// Requests received so far.
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().expect("lock poisoned").clone()
    }
}

async fn homework_statuses(
    State(state): State<ReviewApiState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.seen.lock().expect("lock poisoned").push(SeenRequest {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        from_date: params.get("from_date").cloned(),
    });

    let reply = state.replies.lock().expect("lock poisoned").pop_front();
    match reply {
        Some(reply) => {
            tokio::time::sleep(reply.delay).await;
            (reply.status, reply.body)
        }
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

// ============================================================================
// Chat API
// ============================================================================

/// One `sendMessage` call seen by the fake chat API.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub bot_segment: String,
    pub chat_id: Value,
    pub text: String,
}

#[derive(Clone)]
struct ChatApiState {
    status: StatusCode,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

/// Handle to a running fake chat API.
pub struct FakeChatApi {
    pub base: String,
    state: ChatApiState,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeChatApi {
    /// Starts a server answering every `sendMessage` call with `status`.
    pub async fn start(status: StatusCode) -> Self {
        let state = ChatApiState {
            status,
            sent: Arc::default(),
        };
        let router = Router::new()
            .route("/:bot/sendMessage", post(send_message))
            .with_state(state.clone());
        let (base, handle) = spawn_server(router).await;

        Self {
            base,
            state,
            _handle: handle,
        }
    }

    /// Messages received so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.sent.lock().expect("lock poisoned").clone()
    }
}

async fn send_message(
    State(state): State<ChatApiState>,
    Path(bot_segment): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.sent.lock().expect("lock poisoned").push(SentMessage {
        bot_segment,
        chat_id: body["chat_id"].clone(),
        text: body["text"].as_str().unwrap_or_default().to_string(),
    });
    let ok = state.status.is_success();
    (state.status, Json(serde_json::json!({ "ok": ok })))
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration pointing at the fake servers with all credentials set.
pub fn config_for(review: &FakeReviewApi, chat: &FakeChatApi) -> Config {
    Config {
        endpoint: review.endpoint.clone(),
        chat_api_base: chat.base.clone(),
        request_timeout_secs: 5,
        ..Config::default()
    }
    .with_credentials(Credentials {
        api_token: Some("review-token".to_string()),
        chat_bot_token: Some("123:abc".to_string()),
        chat_destination_id: Some("4242".to_string()),
    })
}
