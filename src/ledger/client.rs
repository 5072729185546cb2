//! Ledger node HTTP client.
//!
//! # Responsibilities
//! - Issue one HTTP call per node operation against a chosen endpoint
//! - Decode response bodies into wire types
//! - Classify every failure before it leaves this module
//!
//! # Design Decisions
//! - The target endpoint is a per-call argument, so the same client talks to
//!   the local node and to any peer
//! - No retries and no timeout beyond the transport default; a stalled call
//!   blocks its caller until the transport gives up

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use url::Url;

use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::{
    ChainResponse, NodeAddress, NodeList, ResolutionResult, StatusMessage, Transaction,
};
use crate::observability::metrics;

/// Base URL of a ledger node, local or peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Parse an http(s) base URL.
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        let invalid = |reason: String| LedgerError::InvalidTarget {
            address: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(Self(url))
    }

    /// Address a peer directly. Bare `host:port` addresses are reached over
    /// plain HTTP.
    pub fn from_node(node: &NodeAddress) -> LedgerResult<Self> {
        let raw = node.as_str().trim();
        if raw.is_empty() {
            return Err(LedgerError::InvalidTarget {
                address: raw.to_string(),
                reason: "empty address".to_string(),
            });
        }
        if raw.contains("://") {
            Self::parse(raw)
        } else {
            Self::parse(&format!("http://{}", raw))
        }
    }

    /// Full URL for an absolute node path such as `/chain`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.0.as_str().trim_end_matches('/'), path)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}

/// The six operations a ledger node exposes.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// `POST /transactions/new`
    async fn submit_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage>;

    /// `GET /mine`
    async fn mine(&self, target: &Endpoint) -> LedgerResult<StatusMessage>;

    /// `POST /transactions/propagate`
    async fn propagate_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage>;

    /// `GET /nodes`
    async fn list_nodes(&self, target: &Endpoint) -> LedgerResult<NodeList>;

    /// `GET /chain`
    async fn fetch_chain(&self, target: &Endpoint) -> LedgerResult<ChainResponse>;

    /// `GET /resolve`
    async fn resolve_conflicts(&self, target: &Endpoint) -> LedgerResult<ResolutionResult>;
}

/// reqwest-backed [`LedgerApi`].
#[derive(Debug, Clone, Default)]
pub struct LedgerClient {
    http: Client,
}

impl LedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots...).
    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &Endpoint,
        path: &str,
    ) -> LedgerResult<T> {
        let url = target.url_for(path);
        let body = self.execute(operation, &url, self.http.get(&url)).await?;
        decode(operation, url, &body)
    }

    async fn send_status(
        &self,
        operation: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> LedgerResult<StatusMessage> {
        let body = self.execute(operation, &url, request).await?;
        Ok(StatusMessage::from_body(&body))
    }

    /// Send the request and return the body of a success response.
    async fn execute(
        &self,
        operation: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> LedgerResult<String> {
        tracing::debug!(operation, url, "Calling ledger node");

        let result = send(url, request).await;
        match &result {
            Ok(_) => metrics::record_ledger_call(operation, "ok"),
            Err(e) => {
                tracing::warn!(operation, url, error = %e, "Ledger call failed");
                metrics::record_ledger_call(operation, e.kind().as_str());
            }
        }
        result
    }
}

async fn send(url: &str, request: RequestBuilder) -> LedgerResult<String> {
    let response = request.send().await.map_err(|source| LedgerError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        // The status alone classifies the failure; the body is best effort.
        let body = response.text().await.unwrap_or_default();
        return Err(LedgerError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }

    response.text().await.map_err(|source| LedgerError::Transport {
        url: url.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(operation: &'static str, url: String, body: &str) -> LedgerResult<T> {
    serde_json::from_str(body).map_err(|source| {
        tracing::warn!(operation, url = %url, error = %source, "Undecodable ledger response");
        LedgerError::Decode { url, source }
    })
}

#[async_trait]
impl LedgerApi for LedgerClient {
    async fn submit_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage> {
        let url = target.url_for("/transactions/new");
        let request = self.http.post(&url).json(transaction);
        self.send_status("submit", url, request).await
    }

    async fn mine(&self, target: &Endpoint) -> LedgerResult<StatusMessage> {
        let url = target.url_for("/mine");
        let request = self.http.get(&url);
        self.send_status("mine", url, request).await
    }

    async fn propagate_transaction(
        &self,
        target: &Endpoint,
        transaction: &Transaction,
    ) -> LedgerResult<StatusMessage> {
        let url = target.url_for("/transactions/propagate");
        let request = self.http.post(&url).json(transaction);
        self.send_status("propagate", url, request).await
    }

    async fn list_nodes(&self, target: &Endpoint) -> LedgerResult<NodeList> {
        self.get_json("list_nodes", target, "/nodes").await
    }

    async fn fetch_chain(&self, target: &Endpoint) -> LedgerResult<ChainResponse> {
        self.get_json("fetch_chain", target, "/chain").await
    }

    async fn resolve_conflicts(&self, target: &Endpoint) -> LedgerResult<ResolutionResult> {
        self.get_json("resolve", target, "/resolve").await
    }
}
