//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (ledger call and workflow counters)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, console mode only)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (operation, stage, node)
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
