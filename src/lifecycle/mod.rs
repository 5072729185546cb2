//! Lifecycle management for the long-running console.
//!
//! # Data Flow
//! ```text
//! ctrl-c (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → ShutdownSignal::fired (console::serve)
//!     → console stops accepting → in-flight requests finish → exit
//! ```
//!
//! One-shot CLI commands do not use this; they end when their workflow does.

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
