//! Local JSON console.
//!
//! # Data Flow
//! ```text
//! Presentation layer (browser page, scripts)
//!     → GET  /api/nodes         → directory refresh → selectable set
//!     → POST /api/transactions  → TransactionWorkflow → summary
//!     → GET  /api/chain         → local chain → view records
//!     → GET  /api/history?node= → PeerHistoryWorkflow → view records
//! ```
//!
//! # Design Decisions
//! - The console holds no selection state; the peer arrives with each request
//! - Workflow failures are reported with their stage: 400 for unmet
//!   preconditions, 502 for node failures

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::TransactionPolicy;
use crate::directory::NodeDirectory;
use crate::ledger::{Endpoint, LedgerApi};
use crate::lifecycle::ShutdownSignal;
use crate::workflow::{PeerHistoryWorkflow, TransactionWorkflow};
use self::handlers::*;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ConsoleState {
    pub ledger: Arc<dyn LedgerApi>,
    pub local: Endpoint,
    pub directory: Arc<NodeDirectory>,
    pub transactions: TransactionWorkflow,
    pub peers: PeerHistoryWorkflow,
}

impl ConsoleState {
    pub fn new(ledger: Arc<dyn LedgerApi>, local: Endpoint, policy: TransactionPolicy) -> Self {
        Self {
            directory: Arc::new(NodeDirectory::new(ledger.clone(), local.clone())),
            transactions: TransactionWorkflow::new(ledger.clone(), local.clone()).with_policy(policy),
            peers: PeerHistoryWorkflow::new(ledger.clone()),
            ledger,
            local,
        }
    }
}

pub fn setup_console_router(state: ConsoleState) -> Router {
    Router::new()
        .route("/api/nodes", get(list_nodes))
        .route("/api/transactions", post(submit_transaction))
        .route("/api/chain", get(local_chain))
        .route("/api/history", get(peer_history))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the console until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    state: ConsoleState,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, node = %state.local, "Console listening");

    axum::serve(listener, setup_console_router(state))
        .with_graceful_shutdown(async move {
            shutdown.fired().await;
            tracing::info!("Console shutting down");
        })
        .await
}
