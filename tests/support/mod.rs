//! Shared test helpers: an in-process stand-in for the spreadsheet web app.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

#[derive(Clone)]
struct SheetState {
    status: StatusCode,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

/// A running fake spreadsheet endpoint
pub struct MockSheet {
    pub url: String,
    pub base: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl MockSheet {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

async fn exec_handler(State(state): State<SheetState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().unwrap().push(body);
    tokio::time::sleep(state.delay).await;
    (state.status, r#"{"result":"success"}"#.to_string())
}

async fn health_handler(State(state): State<SheetState>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.status
}

/// Start a fake endpoint answering `POST /exec` and `GET /health` with
/// `status` after `delay`. Binds to port 0.
pub async fn start_mock_sheet(status: StatusCode, delay: Duration) -> MockSheet {
    let state = SheetState {
        status,
        delay,
        hits: Arc::new(AtomicUsize::new(0)),
        bodies: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/exec", post(exec_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockSheet {
        url: format!("http://{addr}/exec"),
        base: format!("http://{addr}"),
        hits: state.hits,
        bodies: state.bodies,
    }
}

/// A URL on which nothing is listening
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/exec")
}
