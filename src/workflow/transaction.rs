//! Submit → mine → propagate against the local node.
//!
//! # State Machine
//! ```text
//! Idle → Submitting → Submitted → Mining → Mined → Propagating → Completed
//!            │                      │                  │
//!            ▼                      ▼                  ▼
//!      Failed(submit)         Failed(mine)      Failed(propagate)
//! ```
//!
//! Each stage is a hard precondition for the next. A failed stage ends the
//! run; nothing already accepted by the node is rolled back.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::TransactionPolicy;
use crate::ledger::{Endpoint, ErrorKind, LedgerApi, LedgerError, LedgerResult, StatusMessage, Transaction};
use crate::observability::metrics;
use crate::workflow::policy::{gate_for, NodeGate};

/// Network stage of a transaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStage {
    Submit,
    Mine,
    Propagate,
}

impl TransactionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStage::Submit => "submit",
            TransactionStage::Mine => "mine",
            TransactionStage::Propagate => "propagate",
        }
    }
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum TransactionState {
    Idle,
    Submitting,
    Submitted,
    Mining,
    Mined,
    Propagating,
    Completed,
    Failed(TransactionStage),
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Completed | TransactionState::Failed(_))
    }
}

/// A stage failed; later stages were not attempted.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct TransactionError {
    pub stage: TransactionStage,
    #[source]
    pub source: LedgerError,
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Everything observed during one run.
#[derive(Debug)]
pub struct TransactionReport {
    pub transaction: Transaction,
    /// Every state entered, starting with `Idle`.
    pub transitions: Vec<TransactionState>,
    /// Node responses of the stages that succeeded, in order.
    pub receipts: Vec<(TransactionStage, StatusMessage)>,
    pub error: Option<TransactionError>,
}

impl TransactionReport {
    fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            transitions: vec![TransactionState::Idle],
            receipts: Vec::new(),
            error: None,
        }
    }

    /// Terminal state of the run.
    pub fn state(&self) -> TransactionState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(TransactionState::Idle)
    }

    pub fn is_completed(&self) -> bool {
        self.state() == TransactionState::Completed
    }

    pub fn failed_stage(&self) -> Option<TransactionStage> {
        match self.state() {
            TransactionState::Failed(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn receipt(&self, stage: TransactionStage) -> Option<&StatusMessage> {
        self.receipts
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, receipt)| receipt)
    }

    /// Record a stage outcome and pick the next state.
    fn settle(
        &mut self,
        stage: TransactionStage,
        outcome: LedgerResult<StatusMessage>,
        next: TransactionState,
    ) -> TransactionState {
        match outcome {
            Ok(receipt) => {
                tracing::info!(
                    stage = %stage,
                    reply = receipt.message.as_deref().unwrap_or(""),
                    "Transaction stage succeeded"
                );
                self.receipts.push((stage, receipt));
                next
            }
            Err(source) => {
                tracing::warn!(stage = %stage, error = %source, "Transaction stage failed");
                self.error = Some(TransactionError { stage, source });
                TransactionState::Failed(stage)
            }
        }
    }
}

/// Drives [`TransactionState`] against one local node.
#[derive(Clone)]
pub struct TransactionWorkflow {
    ledger: Arc<dyn LedgerApi>,
    local: Endpoint,
    gate: Option<NodeGate>,
}

impl TransactionWorkflow {
    pub fn new(ledger: Arc<dyn LedgerApi>, local: Endpoint) -> Self {
        Self {
            ledger,
            local,
            gate: None,
        }
    }

    /// Apply a concurrency policy across runs of this workflow (and its clones).
    pub fn with_policy(mut self, policy: TransactionPolicy) -> Self {
        self.gate = gate_for(policy);
        self
    }

    /// Share an existing gate, e.g. between workflows targeting the same nodes.
    pub fn with_gate(mut self, gate: NodeGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn local(&self) -> &Endpoint {
        &self.local
    }

    /// Run the workflow to a terminal state.
    pub async fn run(&self, transaction: Transaction) -> TransactionReport {
        let _guard = match &self.gate {
            Some(gate) => Some(gate.acquire(&self.local).await),
            None => None,
        };

        tracing::info!(node = %self.local, transaction = %transaction, "Starting transaction workflow");

        let mut report = TransactionReport::new(transaction);
        let mut state = TransactionState::Idle;

        while !state.is_terminal() {
            state = match state {
                TransactionState::Idle => TransactionState::Submitting,
                TransactionState::Submitting => {
                    let outcome = self
                        .ledger
                        .submit_transaction(&self.local, &report.transaction)
                        .await;
                    report.settle(TransactionStage::Submit, outcome, TransactionState::Submitted)
                }
                TransactionState::Submitted => TransactionState::Mining,
                TransactionState::Mining => {
                    let outcome = self.ledger.mine(&self.local).await;
                    report.settle(TransactionStage::Mine, outcome, TransactionState::Mined)
                }
                TransactionState::Mined => TransactionState::Propagating,
                TransactionState::Propagating => {
                    let outcome = self
                        .ledger
                        .propagate_transaction(&self.local, &report.transaction)
                        .await;
                    report.settle(TransactionStage::Propagate, outcome, TransactionState::Completed)
                }
                TransactionState::Completed | TransactionState::Failed(_) => state,
            };
            tracing::debug!(node = %self.local, state = ?state, "Transaction workflow transition");
            report.transitions.push(state);
        }

        let outcome = match report.failed_stage() {
            None => {
                tracing::info!(node = %self.local, "Transaction workflow completed");
                "ok".to_string()
            }
            Some(stage) => format!("failed_{}", stage),
        };
        metrics::record_workflow_run("transaction", outcome);

        report
    }
}

impl fmt::Debug for TransactionWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionWorkflow")
            .field("local", &self.local)
            .field("serialized", &self.gate.is_some())
            .finish()
    }
}
