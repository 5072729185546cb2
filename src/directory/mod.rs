//! Node directory.
//!
//! Mirrors the local node's peer list for selection. A refresh is a single
//! fetch-and-replace; the list keeps the server's order and duplicates.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::ledger::{Endpoint, ErrorKind, LedgerApi, LedgerError, NodeAddress};

/// Label of the leading "no selection" entry.
pub const NO_SELECTION_LABEL: &str = "Select a node";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to refresh node list: {0}")]
    Refresh(#[from] LedgerError),

    #[error("node '{0}' is not in the directory")]
    UnknownNode(String),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Refresh(e) => e.kind(),
            DirectoryError::UnknownNode(_) => ErrorKind::Precondition,
        }
    }
}

/// One entry of the selectable set. The sentinel has an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeOption {
    pub value: String,
    pub label: String,
}

impl NodeOption {
    pub fn none() -> Self {
        Self {
            value: String::new(),
            label: NO_SELECTION_LABEL.to_string(),
        }
    }

    pub fn node(address: &NodeAddress) -> Self {
        Self {
            value: address.to_string(),
            label: address.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.value.is_empty()
    }
}

/// Cached peer list of the local node.
pub struct NodeDirectory {
    ledger: Arc<dyn LedgerApi>,
    local: Endpoint,
    nodes: ArcSwap<Vec<NodeAddress>>,
}

impl NodeDirectory {
    pub fn new(ledger: Arc<dyn LedgerApi>, local: Endpoint) -> Self {
        Self {
            ledger,
            local,
            nodes: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Fetch `/nodes` and replace the cached list. On failure the previous
    /// list stays in place.
    pub async fn refresh(&self) -> Result<Arc<Vec<NodeAddress>>, DirectoryError> {
        let list = self.ledger.list_nodes(&self.local).await?;
        tracing::info!(node = %self.local, peers = list.total_nodes.len(), "Node directory refreshed");

        let nodes = Arc::new(list.total_nodes);
        self.nodes.store(nodes.clone());
        Ok(nodes)
    }

    /// Cached peers in server order.
    pub fn nodes(&self) -> Arc<Vec<NodeAddress>> {
        self.nodes.load_full()
    }

    /// The selectable set: the sentinel followed by every cached peer.
    pub fn options(&self) -> Vec<NodeOption> {
        let nodes = self.nodes.load();
        std::iter::once(NodeOption::none())
            .chain(nodes.iter().map(NodeOption::node))
            .collect()
    }

    /// Map a selection value to a peer. An empty value is "no selection".
    pub fn select(&self, value: &str) -> Result<Option<NodeAddress>, DirectoryError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        self.nodes
            .load()
            .iter()
            .find(|node| node.as_str() == value)
            .cloned()
            .map(Some)
            .ok_or_else(|| DirectoryError::UnknownNode(value.to_string()))
    }

    /// Like [`select`](Self::select), but a value missing from the cache
    /// triggers one refresh before it is rejected. Covers a cold cache and
    /// peers registered since the last refresh.
    pub async fn select_fresh(&self, value: &str) -> Result<Option<NodeAddress>, DirectoryError> {
        match self.select(value) {
            Err(DirectoryError::UnknownNode(_)) => {
                tracing::debug!(node = value.trim(), "Selection not cached; refreshing directory");
                self.refresh().await?;
                self.select(value)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for NodeDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDirectory")
            .field("local", &self.local)
            .field("nodes", &self.nodes.load().len())
            .finish()
    }
}
