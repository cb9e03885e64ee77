//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (human format) and rotated JSON files
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - The tracing facade is always used; with no subscriber installed,
//!   events are no-ops, so libraries never fail for lack of a logger
//! - File output is JSON for machine parsing; stdout stays readable
//! - Metric updates are cheap (atomic) and recorded in middleware

pub mod logging;
pub mod metrics;
