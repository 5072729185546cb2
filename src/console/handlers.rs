use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::console::ConsoleState;
use crate::directory::NodeOption;
use crate::ledger::{ErrorKind, ResolutionResult, StatusMessage, Transaction};
use crate::view::{self, BlockRecord, HistoryView};
use crate::workflow::{
    PeerHistoryReport, PeerHistoryState, TransactionReport, TransactionStage, TransactionState,
};

#[derive(Debug, Serialize)]
pub struct Failure {
    pub stage: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NodesResponse {
    pub options: Vec<NodeOption>,
}

#[derive(Debug, Serialize)]
pub struct StageReceipt {
    pub stage: TransactionStage,
    pub response: StatusMessage,
}

#[derive(Debug, Serialize)]
pub struct TransactionSummary {
    pub transaction: Transaction,
    pub state: TransactionState,
    pub transitions: Vec<TransactionState>,
    pub receipts: Vec<StageReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl From<TransactionReport> for TransactionSummary {
    fn from(report: TransactionReport) -> Self {
        Self {
            state: report.state(),
            failure: report.error.as_ref().map(|e| Failure {
                stage: e.stage.as_str(),
                kind: e.kind(),
                message: e.to_string(),
            }),
            transaction: report.transaction,
            transitions: report.transitions,
            receipts: report
                .receipts
                .into_iter()
                .map(|(stage, response)| StageReceipt { stage, response })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChainBlocks {
    pub blocks: Vec<BlockRecord>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub node: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistorySummary {
    pub state: PeerHistoryState,
    pub transitions: Vec<PeerHistoryState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl From<PeerHistoryReport> for HistorySummary {
    fn from(report: PeerHistoryReport) -> Self {
        let history = match (&report.node, &report.chain) {
            (Some(node), Some(chain)) => Some(view::render_history(node, chain)),
            _ => None,
        };
        Self {
            state: report.state(),
            failure: report.error.as_ref().map(|e| Failure {
                stage: e.stage().as_str(),
                kind: e.kind(),
                message: e.to_string(),
            }),
            transitions: report.transitions,
            resolution: report.resolution,
            history,
        }
    }
}

fn failure_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Precondition => StatusCode::BAD_REQUEST,
        ErrorKind::Transport | ErrorKind::Server => StatusCode::BAD_GATEWAY,
    }
}

fn failure_response(stage: &'static str, kind: ErrorKind, message: String) -> Response {
    (
        failure_status(kind),
        Json(Failure {
            stage,
            kind,
            message,
        }),
    )
        .into_response()
}

/// `GET /api/nodes`: refresh the directory and return the selectable set.
pub async fn list_nodes(State(state): State<ConsoleState>) -> Response {
    match state.directory.refresh().await {
        Ok(_) => Json(NodesResponse {
            options: state.directory.options(),
        })
        .into_response(),
        Err(e) => failure_response("list_nodes", e.kind(), e.to_string()),
    }
}

/// `POST /api/transactions`: submit, mine and propagate.
pub async fn submit_transaction(
    State(state): State<ConsoleState>,
    Json(transaction): Json<Transaction>,
) -> Response {
    let report = state.transactions.run(transaction).await;
    let status = match report.error.as_ref() {
        None => StatusCode::OK,
        Some(e) => failure_status(e.kind()),
    };
    (status, Json(TransactionSummary::from(report))).into_response()
}

/// `GET /api/chain`: the local node's chain as display records.
pub async fn local_chain(State(state): State<ConsoleState>) -> Response {
    match state.ledger.fetch_chain(&state.local).await {
        Ok(response) => Json(ChainBlocks {
            blocks: view::render_chain(&response.chain),
        })
        .into_response(),
        Err(e) => failure_response("fetch", e.kind(), e.to_string()),
    }
}

/// `GET /api/history?node=<addr>`: resolve then fetch a listed peer's chain.
pub async fn peer_history(
    State(state): State<ConsoleState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let selection = match state
        .directory
        .select_fresh(query.node.as_deref().unwrap_or(""))
        .await
    {
        Ok(selection) => selection,
        Err(e) => return failure_response("select", e.kind(), e.to_string()),
    };

    let report = state.peers.run(selection).await;
    let status = match report.error.as_ref() {
        None => StatusCode::OK,
        Some(e) => failure_status(e.kind()),
    };
    (status, Json(HistorySummary::from(report))).into_response()
}

/// Any unmatched path.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
