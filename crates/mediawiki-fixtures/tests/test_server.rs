// Test Server - Fake WebDriver remote end for integration tests
//
// Implements just enough of the W3C WebDriver HTTP protocol to exercise
// RemoteSession and BrowserFactory offline, and records what it was sent.
//
// - browserName "broken" makes new-session fail with "session not created"
// - selector "#missing" makes find-element fail with "no such element"
// - `reject_window_rect` makes window/rect fail with "invalid argument"
// - unknown paths get a plain-text 404, like a misconfigured grid URL

// Note: Functions appear "unused" because each test binary compiles separately,
// but they ARE used across multiple test files. Suppress false-positive warnings.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::task::JoinHandle;

pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Everything the fake driver has been asked to do
#[derive(Default)]
pub struct DriverState {
    pub new_sessions: Mutex<Vec<Value>>,
    pub urls: Mutex<HashMap<String, String>>,
    pub window_rects: Mutex<Vec<(String, Value)>>,
    pub deleted: Mutex<Vec<String>>,
    pub reject_window_rect: AtomicBool,
    next_id: AtomicUsize,
}

impl DriverState {
    pub fn sessions_created(&self) -> usize {
        self.next_id.load(Ordering::SeqCst)
    }

    /// `alwaysMatch` capabilities of the n-th new-session request
    pub fn capabilities(&self, n: usize) -> Value {
        self.new_sessions.lock()[n]["capabilities"]["alwaysMatch"].clone()
    }
}

/// Fake WebDriver server handle
pub struct FakeWebDriver {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    state: Arc<DriverState>,
}

impl FakeWebDriver {
    /// Start the fake driver on a random available port
    pub async fn start() -> Self {
        let state = Arc::new(DriverState::default());

        let app = Router::new()
            .route("/session", post(new_session))
            .route("/session/{id}", delete(delete_session))
            .route("/session/{id}/url", post(navigate).get(current_url))
            .route("/session/{id}/element", post(find_element))
            .route("/session/{id}/window/rect", post(set_window_rect))
            .fallback(not_found)
            .with_state(Arc::clone(&state));

        // Bind to port 0 to get any available port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake WebDriver");

        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake WebDriver failed");
        });

        Self {
            addr,
            handle,
            state,
        }
    }

    /// Endpoint to hand to RemoteSessionConstructor
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

type Reply = (StatusCode, Json<Value>);

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "value": value })))
}

fn error(status: StatusCode, code: &str, message: &str) -> Reply {
    (
        status,
        Json(json!({ "value": { "error": code, "message": message } })),
    )
}

fn is_deleted(state: &DriverState, id: &str) -> bool {
    state.deleted.lock().iter().any(|deleted| deleted == id)
}

async fn new_session(State(state): State<Arc<DriverState>>, Json(payload): Json<Value>) -> Reply {
    let browser = payload["capabilities"]["alwaysMatch"]["browserName"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.new_sessions.lock().push(payload);

    if browser == "broken" {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session not created",
            "no such browser",
        );
    }

    let id = format!("session-{}", state.next_id.fetch_add(1, Ordering::SeqCst));
    ok(json!({ "sessionId": id, "capabilities": { "browserName": browser } }))
}

async fn delete_session(State(state): State<Arc<DriverState>>, Path(id): Path<String>) -> Reply {
    state.deleted.lock().push(id);
    ok(Value::Null)
}

async fn navigate(
    State(state): State<Arc<DriverState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if is_deleted(&state, &id) {
        return error(StatusCode::NOT_FOUND, "invalid session id", &id);
    }
    let url = body["url"].as_str().unwrap_or_default().to_string();
    state.urls.lock().insert(id, url);
    ok(Value::Null)
}

async fn current_url(State(state): State<Arc<DriverState>>, Path(id): Path<String>) -> Reply {
    let url = state
        .urls
        .lock()
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "about:blank".to_string());
    ok(json!(url))
}

async fn find_element(
    State(state): State<Arc<DriverState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if is_deleted(&state, &id) {
        return error(StatusCode::NOT_FOUND, "invalid session id", &id);
    }
    let selector = body["value"].as_str().unwrap_or_default();
    if selector == "#missing" {
        return error(
            StatusCode::NOT_FOUND,
            "no such element",
            &format!("Unable to locate element: {}", selector),
        );
    }
    ok(json!({ ELEMENT_KEY: format!("element{}", selector.replace('#', "-")) }))
}

async fn set_window_rect(
    State(state): State<Arc<DriverState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if state.reject_window_rect.load(Ordering::SeqCst) {
        return error(StatusCode::BAD_REQUEST, "invalid argument", "bad window rect");
    }
    state.window_rects.lock().push((id, body.clone()));
    ok(body)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
