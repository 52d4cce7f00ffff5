//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Configure the log filter from the manifest or `RUST_LOG`
//! - Per-request event helpers honouring `LoggerLevel`

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggerLevel;
use crate::transport::{Request, Response};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directive`. Calling this twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Log an outgoing request at the client's level.
pub fn log_request(level: LoggerLevel, context_id: &str, method_key: &str, request: &Request) {
    match level {
        LoggerLevel::None => {}
        LoggerLevel::Basic => {
            tracing::info!(context_id = %context_id, method = %method_key, http_method = %request.method, url = %request.url, "--->");
        }
        LoggerLevel::Headers => {
            tracing::info!(
                context_id = %context_id,
                method = %method_key,
                http_method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                "--->"
            );
        }
        LoggerLevel::Full => {
            let body = request.body.as_deref().map(String::from_utf8_lossy);
            tracing::info!(
                context_id = %context_id,
                method = %method_key,
                http_method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body = ?body,
                "--->"
            );
        }
    }
}

/// Log a received response at the client's level.
pub fn log_response(level: LoggerLevel, context_id: &str, method_key: &str, response: &Response, elapsed: Duration) {
    match level {
        LoggerLevel::None => {}
        LoggerLevel::Basic => {
            tracing::info!(context_id = %context_id, method = %method_key, status = %response.status, elapsed = ?elapsed, "<---");
        }
        LoggerLevel::Headers => {
            tracing::info!(
                context_id = %context_id,
                method = %method_key,
                status = %response.status,
                elapsed = ?elapsed,
                headers = ?response.headers,
                "<---"
            );
        }
        LoggerLevel::Full => {
            tracing::info!(
                context_id = %context_id,
                method = %method_key,
                status = %response.status,
                elapsed = ?elapsed,
                headers = ?response.headers,
                body = %response.text(),
                "<---"
            );
        }
    }
}
