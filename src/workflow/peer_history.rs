//! Resolve → fetch against a selected peer.
//!
//! # State Machine
//! ```text
//! Idle → Resolving → Resolved → Fetching → Completed
//!   │        │                      │
//!   ▼        ▼                      ▼
//! Failed(select) Failed(resolve)  Failed(fetch)
//! ```
//!
//! The chain is fetched only after resolution has finished; fetching first
//! could return a chain the peer is about to replace.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::ledger::{
    Chain, Endpoint, ErrorKind, LedgerApi, LedgerError, NodeAddress, ResolutionResult,
};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerHistoryStage {
    /// Choosing the peer; no network call.
    Select,
    Resolve,
    Fetch,
}

impl PeerHistoryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerHistoryStage::Select => "select",
            PeerHistoryStage::Resolve => "resolve",
            PeerHistoryStage::Fetch => "fetch",
        }
    }
}

impl fmt::Display for PeerHistoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum PeerHistoryState {
    Idle,
    Resolving,
    Resolved,
    Fetching,
    Completed,
    Failed(PeerHistoryStage),
}

impl PeerHistoryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PeerHistoryState::Completed | PeerHistoryState::Failed(_))
    }
}

#[derive(Debug, Error)]
pub enum PeerHistoryError {
    #[error("no node selected")]
    NoNodeSelected,

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PeerHistoryStage,
        #[source]
        source: LedgerError,
    },
}

impl PeerHistoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PeerHistoryError::NoNodeSelected => ErrorKind::Precondition,
            PeerHistoryError::Stage { source, .. } => source.kind(),
        }
    }

    pub fn stage(&self) -> PeerHistoryStage {
        match self {
            PeerHistoryError::NoNodeSelected => PeerHistoryStage::Select,
            PeerHistoryError::Stage { stage, .. } => *stage,
        }
    }
}

/// Everything observed while loading one peer's history.
#[derive(Debug)]
pub struct PeerHistoryReport {
    pub node: Option<NodeAddress>,
    pub transitions: Vec<PeerHistoryState>,
    pub resolution: Option<ResolutionResult>,
    pub chain: Option<Chain>,
    pub error: Option<PeerHistoryError>,
}

impl PeerHistoryReport {
    pub fn state(&self) -> PeerHistoryState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(PeerHistoryState::Idle)
    }

    pub fn is_completed(&self) -> bool {
        self.state() == PeerHistoryState::Completed
    }

    pub fn failed_stage(&self) -> Option<PeerHistoryStage> {
        match self.state() {
            PeerHistoryState::Failed(stage) => Some(stage),
            _ => None,
        }
    }

    fn fail(&mut self, error: PeerHistoryError) -> PeerHistoryState {
        tracing::warn!(node = ?self.node, stage = %error.stage(), error = %error, "Peer history failed");
        let stage = error.stage();
        self.error = Some(error);
        PeerHistoryState::Failed(stage)
    }
}

/// Loads a peer's reconciled chain.
#[derive(Clone)]
pub struct PeerHistoryWorkflow {
    ledger: Arc<dyn LedgerApi>,
}

impl PeerHistoryWorkflow {
    pub fn new(ledger: Arc<dyn LedgerApi>) -> Self {
        Self { ledger }
    }

    /// Run against the selected peer. `None` fails without touching the network.
    pub async fn run(&self, selection: Option<NodeAddress>) -> PeerHistoryReport {
        let mut report = PeerHistoryReport {
            node: selection,
            transitions: vec![PeerHistoryState::Idle],
            resolution: None,
            chain: None,
            error: None,
        };
        let mut target: Option<Endpoint> = None;
        let mut state = PeerHistoryState::Idle;

        while !state.is_terminal() {
            state = match state {
                PeerHistoryState::Idle => match report.node.as_ref().map(Endpoint::from_node) {
                    None => report.fail(PeerHistoryError::NoNodeSelected),
                    Some(Err(source)) => report.fail(PeerHistoryError::Stage {
                        stage: PeerHistoryStage::Select,
                        source,
                    }),
                    Some(Ok(endpoint)) => {
                        tracing::info!(node = %endpoint, "Loading peer history");
                        target = Some(endpoint);
                        PeerHistoryState::Resolving
                    }
                },
                PeerHistoryState::Resolving => match target.as_ref() {
                    Some(endpoint) => self.resolve(endpoint, &mut report).await,
                    None => report.fail(PeerHistoryError::NoNodeSelected),
                },
                PeerHistoryState::Resolved => PeerHistoryState::Fetching,
                PeerHistoryState::Fetching => match target.as_ref() {
                    Some(endpoint) => self.fetch(endpoint, &mut report).await,
                    None => report.fail(PeerHistoryError::NoNodeSelected),
                },
                PeerHistoryState::Completed | PeerHistoryState::Failed(_) => state,
            };
            tracing::debug!(node = ?report.node, state = ?state, "Peer history transition");
            report.transitions.push(state);
        }

        let outcome = match report.failed_stage() {
            None => "ok".to_string(),
            Some(stage) => format!("failed_{}", stage),
        };
        metrics::record_workflow_run("peer_history", outcome);

        report
    }

    async fn resolve(&self, endpoint: &Endpoint, report: &mut PeerHistoryReport) -> PeerHistoryState {
        match self.ledger.resolve_conflicts(endpoint).await {
            Ok(resolution) => {
                // Informational only; the chain is fetched either way.
                if resolution.resolved {
                    tracing::info!(node = %endpoint, "Peer resolved conflicts; chain was replaced");
                } else {
                    tracing::info!(node = %endpoint, "Peer reported no conflicts");
                }
                report.resolution = Some(resolution);
                PeerHistoryState::Resolved
            }
            Err(source) => report.fail(PeerHistoryError::Stage {
                stage: PeerHistoryStage::Resolve,
                source,
            }),
        }
    }

    async fn fetch(&self, endpoint: &Endpoint, report: &mut PeerHistoryReport) -> PeerHistoryState {
        match self.ledger.fetch_chain(endpoint).await {
            Ok(response) => {
                tracing::info!(node = %endpoint, blocks = response.chain.len(), "Fetched peer chain");
                report.chain = Some(response.chain);
                PeerHistoryState::Completed
            }
            Err(source) => report.fail(PeerHistoryError::Stage {
                stage: PeerHistoryStage::Fetch,
                source,
            }),
        }
    }
}

impl fmt::Debug for PeerHistoryWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHistoryWorkflow").finish_non_exhaustive()
    }
}
