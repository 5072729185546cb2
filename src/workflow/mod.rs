//! Workflow subsystem.
//!
//! # Data Flow
//! ```text
//! User action (Transaction)
//!     → transaction.rs (submit → mine → propagate, local node)
//!     → TransactionReport
//!
//! Selected peer (Option<NodeAddress>)
//!     → peer_history.rs (resolve → fetch, peer addressed directly)
//!     → PeerHistoryReport → view
//! ```
//!
//! # Design Decisions
//! - Each workflow is an explicit state machine; a stage is issued only
//!   after the previous one has resolved
//! - The first failure is terminal; nothing is retried or compensated
//! - Workflows share no mutable state; concurrent transaction runs are
//!   governed by policy.rs

pub mod peer_history;
pub mod policy;
pub mod transaction;

pub use peer_history::{
    PeerHistoryError, PeerHistoryReport, PeerHistoryStage, PeerHistoryState, PeerHistoryWorkflow,
};
pub use policy::NodeGate;
pub use transaction::{
    TransactionError, TransactionReport, TransactionStage, TransactionState, TransactionWorkflow,
};
