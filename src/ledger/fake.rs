//! In-memory ledger node used by unit tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::ledger::client::{Endpoint, LedgerApi};
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::{
    Chain, ChainResponse, NodeAddress, NodeList, ResolutionResult, StatusMessage, Transaction,
};

/// A call observed by [`FakeLedger`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Submit(Endpoint, Transaction),
    Mine(Endpoint),
    Propagate(Endpoint, Transaction),
    ListNodes(Endpoint),
    FetchChain(Endpoint),
    Resolve(Endpoint),
}

impl Call {
    pub fn path(&self) -> &'static str {
        match self {
            Call::Submit(..) => "/transactions/new",
            Call::Mine(_) => "/mine",
            Call::Propagate(..) => "/transactions/propagate",
            Call::ListNodes(_) => "/nodes",
            Call::FetchChain(_) => "/chain",
            Call::Resolve(_) => "/resolve",
        }
    }
}

/// Records every call and fails the paths it is told to fail.
#[derive(Debug, Default)]
pub struct FakeLedger {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<&'static str>,
    nodes: Vec<NodeAddress>,
    chain: Chain,
    resolved: bool,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, path: &'static str) -> Self {
        self.failing.insert(path);
        self
    }

    pub fn with_nodes(mut self, nodes: &[&str]) -> Self {
        self.nodes = nodes.iter().map(|n| NodeAddress::from(*n)).collect();
        self
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<&'static str> {
        self.calls().iter().map(Call::path).collect()
    }

    /// Yield once before answering, so concurrent callers interleave the way
    /// they would against a real node.
    async fn record<T>(&self, call: Call, ok: impl FnOnce() -> T + Send) -> LedgerResult<T> {
        tokio::task::yield_now().await;

        let path = call.path();
        let url = match &call {
            Call::Submit(t, _)
            | Call::Mine(t)
            | Call::Propagate(t, _)
            | Call::ListNodes(t)
            | Call::FetchChain(t)
            | Call::Resolve(t) => t.url_for(path),
        };
        self.calls.lock().unwrap().push(call);

        if self.failing.contains(path) {
            return Err(LedgerError::Status {
                url,
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "injected failure".to_string(),
            });
        }
        Ok(ok())
    }
}

fn status(message: &str) -> StatusMessage {
    StatusMessage {
        message: Some(message.to_string()),
        ..StatusMessage::default()
    }
}

#[async_trait]
impl LedgerApi for FakeLedger {
    async fn submit_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage> {
        self.record(Call::Submit(target.clone(), transaction.clone()), || {
            status("transaction accepted")
        })
        .await
    }

    async fn mine(&self, target: &Endpoint) -> LedgerResult<StatusMessage> {
        self.record(Call::Mine(target.clone()), || status("block mined")).await
    }

    async fn propagate_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage> {
        self.record(Call::Propagate(target.clone(), transaction.clone()), || {
            status("transaction propagated")
        })
        .await
    }

    async fn list_nodes(&self, target: &Endpoint) -> LedgerResult<NodeList> {
        self.record(Call::ListNodes(target.clone()), || NodeList {
            total_nodes: self.nodes.clone(),
        })
        .await
    }

    async fn fetch_chain(&self, target: &Endpoint) -> LedgerResult<ChainResponse> {
        self.record(Call::FetchChain(target.clone()), || ChainResponse {
            length: Some(self.chain.len() as u64),
            chain: self.chain.clone(),
        })
        .await
    }

    async fn resolve_conflicts(&self, target: &Endpoint) -> LedgerResult<ResolutionResult> {
        self.record(Call::Resolve(target.clone()), || ResolutionResult {
            resolved: self.resolved,
            message: None,
        })
        .await
    }
}
