//! Retry policies handed to transports.
//!
//! # Data Flow
//! ```text
//! ResolvedClientConfig.retryer
//!     → RequestOptions (passed opaquely with every request)
//!     → transport asks the retryer for the next delay after a retryable failure
//! ```
//!
//! # Design Decisions
//! - The client core never retries by itself; transports decide
//! - Only connection and timeout failures are retryable
//! - `NeverRetry` is the process-wide default

pub mod retryer;

pub use retryer::{DefaultRetryer, NeverRetry, Retryer};
