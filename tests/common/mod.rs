//! Shared utilities for integration testing.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request observed by a mock node.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: String,
}

impl RecordedCall {
    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Responder = Arc<dyn Fn(&Method, &str) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responder: Responder,
}

/// A programmable ledger node bound to an ephemeral local port.
pub struct MockNode {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockNode {
    /// Start a node answering every request with `responder(method, path)`.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Method, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            calls: calls.clone(),
            responder: Arc::new(responder),
        };
        let app = Router::new().fallback(handle).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, calls }
    }

    /// A well-behaved node: every endpoint succeeds except those in `failing`.
    #[allow(dead_code)]
    pub async fn ledger(failing: &'static [&'static str], nodes: Vec<String>) -> Self {
        Self::start(move |_, path| {
            if failing.iter().any(|failed| *failed == path) {
                return (500, "Internal Server Error".to_string());
            }
            standard_reply(path, &nodes)
        })
        .await
    }

    /// `http://127.0.0.1:<port>`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `127.0.0.1:<port>`, as a directory would list it.
    #[allow(dead_code)]
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let (status, reply) = (state.responder)(&method, &path);

    state.calls.lock().unwrap().push(RecordedCall {
        method,
        path,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        reply,
    )
}

/// Two-block chain: genesis plus one block holding Alice → Bob and the
/// mining reward.
#[allow(dead_code)]
pub fn two_block_chain() -> serde_json::Value {
    json!({
        "chain": [
            {
                "index": 1,
                "timestamp": 1700000000.0,
                "transactions": [],
                "proof": 100,
                "previous_hash": "1"
            },
            {
                "index": 2,
                "timestamp": 1700000060.5,
                "transactions": [
                    {"sender": "Alice", "recipient": "Bob", "amount": "10"},
                    {"sender": "0", "recipient": "a1b2c3", "amount": 1}
                ],
                "proof": 35293,
                "previous_hash": "5d41402abc4b2a76b9719d911017c592"
            }
        ],
        "length": 2
    })
}

#[allow(dead_code)]
pub fn standard_reply(path: &str, nodes: &[String]) -> (u16, String) {
    let body = match path {
        "/transactions/new" => json!({"message": "Transaction created and block mined", "index": 2}),
        "/mine" => json!({"message": "New block mined", "index": 3}),
        "/transactions/propagate" => json!({"message": "Transaction propagated to nodes"}),
        "/nodes" => json!({"total_nodes": nodes}),
        "/chain" => two_block_chain(),
        "/resolve" => json!({"resolved": true, "message": "Chain replaced by consensus"}),
        _ => return (404, "Not Found".to_string()),
    };
    let status = if path == "/transactions/new" { 201 } else { 200 };
    (status, body.to_string())
}
