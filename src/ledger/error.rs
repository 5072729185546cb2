//! Failure classification for ledger node calls.

use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse failure class reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The call could not complete (connectivity, DNS, refused connection).
    Transport,
    /// The call completed but the node did not accept it.
    Server,
    /// A precondition was not met and no call was made.
    Precondition,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Server => "server",
            ErrorKind::Precondition => "precondition",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to a ledger node.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The node answered successfully but the body was not what we expect.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The target address cannot be turned into a request URL.
    #[error("invalid node address '{address}': {reason}")]
    InvalidTarget { address: String, reason: String },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Transport { .. } => ErrorKind::Transport,
            LedgerError::Status { .. } | LedgerError::Decode { .. } => ErrorKind::Server,
            LedgerError::InvalidTarget { .. } => ErrorKind::Precondition,
        }
    }
}

/// Result type for ledger node operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
