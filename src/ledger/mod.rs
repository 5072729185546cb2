//! Ledger node integration subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint (local node or peer base URL)
//!     → client.rs (one HTTP call per node operation)
//!     → types.rs (decoded response bodies)
//!     → error.rs (failure classified at this boundary)
//! ```
//!
//! # Design Decisions
//! - The node owns all chain state; the client only reads and relays it
//! - Every failure is classified here and surfaced unchanged to callers
//! - No retries and no client-side timeouts

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{Endpoint, LedgerApi, LedgerClient};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use types::{
    Amount, Block, Chain, ChainResponse, NodeAddress, NodeList, ResolutionResult, StatusMessage,
    Transaction,
};
