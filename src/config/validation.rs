//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//! - Reject empty component references and client contracts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RuntimeConfig → Result<(), Vec<PropertyError>>
//! - A partial timeout pair is accepted here; the resolver ignores it

use std::fmt;

use crate::config::schema::{ClientConfigProperties, RuntimeConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl PropertyError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for PropertyError {}

/// Validate a runtime manifest.
pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<PropertyError>> {
    let mut errors = Vec::new();

    if config.client.default_config.trim().is_empty() {
        errors.push(PropertyError::new("client.default_config", "must not be empty"));
    }

    let mut names: Vec<&String> = config.client.config.keys().collect();
    names.sort();
    for name in names {
        if let Some(section) = config.client.config.get(name) {
            validate_section(&format!("client.config.{}", name), section, &mut errors);
        }
    }

    if config.load_balancing.healthy_threshold == 0 {
        errors.push(PropertyError::new("load_balancing.healthy_threshold", "must be greater than 0"));
    }
    if config.load_balancing.unhealthy_threshold == 0 {
        errors.push(PropertyError::new("load_balancing.unhealthy_threshold", "must be greater than 0"));
    }

    for (i, instance) in config.services.iter().enumerate() {
        if instance.service.trim().is_empty() {
            errors.push(PropertyError::new(format!("services[{}].service", i), "must not be empty"));
        }
        if instance.address.trim().is_empty() {
            errors.push(PropertyError::new(format!("services[{}].address", i), "must not be empty"));
        }
        if instance.max_connections == 0 {
            errors.push(PropertyError::new(format!("services[{}].max_connections", i), "must be greater than 0"));
        }
    }

    for (i, client) in config.clients.iter().enumerate() {
        if client.contract.trim().is_empty() {
            errors.push(PropertyError::new(format!("clients[{}].contract", i), "must not be empty"));
        }
    }

    if config.enable.type_name.trim().is_empty() {
        errors.push(PropertyError::new("enable.type_name", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_section(prefix: &str, section: &ClientConfigProperties, errors: &mut Vec<PropertyError>) {
    if section.connect_timeout_ms == Some(0) {
        errors.push(PropertyError::new(format!("{}.connect_timeout_ms", prefix), "must be greater than 0"));
    }
    if section.read_timeout_ms == Some(0) {
        errors.push(PropertyError::new(format!("{}.read_timeout_ms", prefix), "must be greater than 0"));
    }

    let references = [
        ("retryer", &section.retryer),
        ("error_decoder", &section.error_decoder),
        ("encoder", &section.encoder),
        ("decoder", &section.decoder),
        ("contract", &section.contract),
    ];
    for (field, value) in references {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            errors.push(PropertyError::new(format!("{}.{}", prefix, field), "component name must not be empty"));
        }
    }

    if let Some(interceptors) = &section.request_interceptors {
        for (i, name) in interceptors.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(PropertyError::new(
                    format!("{}.request_interceptors[{}]", prefix, i),
                    "component name must not be empty",
                ));
            }
        }
    }
}
