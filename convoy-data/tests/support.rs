//! Minimal distance-matrix service used by the HTTP provider tests.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

/// Requests observed by the stub service.
#[derive(Debug, Default)]
pub struct Observed {
    /// Number of requests served.
    pub requests: AtomicUsize,
    /// API keys received, in request order.
    pub keys: std::sync::Mutex<Vec<String>>,
}

impl Observed {
    /// Number of requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Answer `origins`/`destinations` with `origin_index * 100 + destination_index`,
/// where an origin's index is its position in the destination list.
async fn indexed(
    State(observed): State<Arc<Observed>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    observed.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(key) = params.get("key") {
        observed
            .keys
            .lock()
            .expect("keys lock should not be poisoned")
            .push(key.clone());
    }
    let origins: Vec<&str> = params
        .get("origins")
        .map_or_else(Vec::new, |s| s.split('|').collect());
    let destinations: Vec<&str> = params
        .get("destinations")
        .map_or_else(Vec::new, |s| s.split('|').collect());
    let rows: Vec<Value> = origins
        .iter()
        .map(|origin| {
            let from = destinations
                .iter()
                .position(|destination| destination == origin)
                .expect("origins are drawn from destinations");
            let elements: Vec<Value> = (0..destinations.len())
                .map(|to| {
                    json!({"status": "OK", "distance": {"text": "", "value": from * 100 + to}})
                })
                .collect();
            json!({ "elements": elements })
        })
        .collect();
    Json(json!({ "status": "OK", "rows": rows }))
}

async fn denied() -> Json<Value> {
    Json(json!({
        "status": "REQUEST_DENIED",
        "error_message": "The provided API key is invalid.",
        "rows": []
    }))
}

async fn unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "try later")
}

/// Start the stub service on an ephemeral port in a background thread.
pub fn spawn_stub_service() -> (SocketAddr, Arc<Observed>) {
    let observed = Arc::new(Observed::default());
    let app = Router::new()
        .route("/matrix", get(indexed))
        .route("/denied", get(denied))
        .route("/unavailable", get(unavailable))
        .with_state(Arc::clone(&observed));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener
        .set_nonblocking(true)
        .expect("listener should become non-blocking");
    let addr = listener.local_addr().expect("listener address");

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("stub runtime should build");
        runtime.block_on(async move {
            let tokio_listener =
                tokio::net::TcpListener::from_std(listener).expect("adopt std listener");
            axum::serve(tokio_listener, app)
                .await
                .expect("stub service should run");
        });
    });

    (addr, observed)
}
