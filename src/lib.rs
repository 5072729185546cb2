//! Ledger console library.
//!
//! Client-side orchestration of a ledger node's multi-step workflows:
//! submit → mine → propagate for transactions, and resolve → fetch for a
//! peer's chain history.

pub mod config;
pub mod console;
pub mod directory;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod view;
pub mod workflow;

pub use config::schema::ConsoleConfig;
pub use ledger::{Endpoint, LedgerApi, LedgerClient};
pub use workflow::{PeerHistoryWorkflow, TransactionWorkflow};
