//! Metrics collection.
//!
//! # Metrics
//! - `client_targets_built_total` (counter): Targets built, by context
//! - `client_requests_total` (counter): invocations by context and outcome
//! - `client_request_duration_seconds` (histogram): invocation latency
//! - `client_fallbacks_total` (counter): calls answered by a fallback
//! - `client_instance_health` (gauge): 1=healthy, 0=unhealthy, per instance

use std::time::Instant;

pub fn record_target_built(context_id: &str) {
    metrics::counter!("client_targets_built_total", "context" => context_id.to_string()).increment(1);
}

pub fn record_request(context_id: &str, outcome: &'static str, start: Instant) {
    let context = context_id.to_string();
    metrics::counter!("client_requests_total", "context" => context.clone(), "outcome" => outcome).increment(1);
    metrics::histogram!("client_request_duration_seconds", "context" => context).record(start.elapsed().as_secs_f64());
}

pub fn record_fallback(context_id: &str) {
    metrics::counter!("client_fallbacks_total", "context" => context_id.to_string()).increment(1);
}

pub fn record_instance_health(service: &str, authority: &str, healthy: bool) {
    metrics::gauge!(
        "client_instance_health",
        "service" => service.to_string(),
        "instance" => authority.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
