//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher / recovery / transport produce:
//!     → logging.rs (structured log events, stderr)
//!     → metrics.rs (counters, histograms)
//!     → spans.rs (dispatch span with a v4 id)
//!
//! Consumers:
//!     → terminal (RUST_LOG filtered)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Dispatch id flows through every event of a call via its span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod spans;
