//! Per-node serialization of transaction workflows.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::TransactionPolicy;
use crate::ledger::Endpoint;

/// One async lock per target node, created on first use.
#[derive(Debug, Clone, Default)]
pub struct NodeGate {
    locks: Arc<DashMap<Endpoint, Arc<Mutex<()>>>>,
}

impl NodeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `target`, then hold it until the guard
    /// is dropped.
    pub async fn acquire(&self, target: &Endpoint) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(target.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of nodes that have been gated so far.
    pub fn tracked_nodes(&self) -> usize {
        self.locks.len()
    }
}

/// Gate for a policy; `None` means runs are not serialized.
pub fn gate_for(policy: TransactionPolicy) -> Option<NodeGate> {
    match policy {
        TransactionPolicy::Concurrent => None,
        TransactionPolicy::SerializePerNode => Some(NodeGate::new()),
    }
}
