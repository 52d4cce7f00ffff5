//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → tracing-subscriber fmt layer (stdout)
//!     → whatever recorder the host installs for the metrics facade
//! ```
//!
//! # Design Decisions
//! - Structured fields (`context_id`, `service`, `url`) on every event
//! - Per-request logging is gated by the client's resolved logger level
//! - Metrics go through the `metrics` facade; without a recorder they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
