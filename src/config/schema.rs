//! Configuration schema definitions.
//!
//! This module defines the property-sourced client configuration and the runtime
//! manifest used to bootstrap clients from a file.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root of the runtime manifest.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Property-sourced client configuration.
    pub client: ClientProperties,

    /// Properties available to `${...}` placeholders.
    pub environment: HashMap<String, String>,

    /// The global enabling declaration.
    pub enable: EnableConfig,

    /// Load balancing settings.
    pub load_balancing: LoadBalancingConfig,

    /// Known service instances.
    pub services: Vec<ServiceInstanceConfig>,

    /// Declared client contracts.
    pub clients: Vec<DeclaredClientConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Verbosity of per-request logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerLevel {
    /// No logging.
    #[default]
    None,
    /// Method, URL, status and elapsed time.
    Basic,
    /// Basic plus request and response headers.
    Headers,
    /// Headers plus bodies.
    Full,
}

/// Property-sourced client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientProperties {
    /// Properties take precedence over code-level configuration.
    pub default_to_properties: bool,

    /// Name of the property section applied to every client.
    pub default_config: String,

    /// Property sections keyed by config name (a contextId or `default_config`).
    pub config: HashMap<String, ClientConfigProperties>,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self {
            default_to_properties: true,
            default_config: "default".to_string(),
            config: HashMap::new(),
        }
    }
}

impl ClientProperties {
    /// Section for a config name, if any.
    pub fn section(&self, name: &str) -> Option<&ClientConfigProperties> {
        self.config.get(name)
    }
}

/// One property configuration fragment. Absent fields do not override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfigProperties {
    pub logger_level: Option<LoggerLevel>,

    /// Connect timeout in milliseconds. Only applied together with `read_timeout_ms`.
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds. Only applied together with `connect_timeout_ms`.
    pub read_timeout_ms: Option<u64>,

    /// Named retryer component.
    pub retryer: Option<String>,

    /// Named error decoder component.
    pub error_decoder: Option<String>,

    /// Named request interceptors, added in order.
    pub request_interceptors: Option<Vec<String>>,

    pub decode404: Option<bool>,

    /// Named encoder component.
    pub encoder: Option<String>,

    /// Named decoder component.
    pub decoder: Option<String>,

    /// Named contract component.
    pub contract: Option<String>,
}

/// The global enabling declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnableConfig {
    /// Fully qualified name of the enabling type.
    pub type_name: String,

    /// Packages scanned for client declarations.
    pub base_packages: Vec<String>,

    /// Explicit allow-list of client contracts. Disables package scanning.
    pub clients: Vec<String>,
}

impl Default for EnableConfig {
    fn default() -> Self {
        Self {
            type_name: "app::Application".to_string(),
            base_packages: Vec::new(),
            clients: Vec::new(),
        }
    }
}

/// Load-balancing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    #[default]
    RoundRobin,
    LeastConnections,
}

/// Load balancing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancingConfig {
    /// Default strategy.
    pub strategy: LoadBalancingStrategy,

    /// Per-service strategy overrides.
    pub per_service: HashMap<String, LoadBalancingStrategy>,

    /// Consecutive successes before an instance is marked healthy.
    pub healthy_threshold: usize,

    /// Consecutive failures before an instance is marked unhealthy.
    pub unhealthy_threshold: usize,
}

impl Default for LoadBalancingConfig {
    fn default() -> Self {
        Self {
            strategy: LoadBalancingStrategy::RoundRobin,
            per_service: HashMap::new(),
            healthy_threshold: 2,
            unhealthy_threshold: 3,
        }
    }
}

impl LoadBalancingConfig {
    pub fn strategy_for(&self, service: &str) -> LoadBalancingStrategy {
        self.per_service.get(service).copied().unwrap_or(self.strategy)
    }
}

/// A backend instance of a logical service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceInstanceConfig {
    /// Logical service name.
    pub service: String,

    /// Instance address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Maximum in-flight requests to this instance.
    #[serde(default = "default_max_instance_conns")]
    pub max_connections: usize,
}

fn default_max_instance_conns() -> usize {
    100
}

/// A client contract declared in the manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DeclaredClientConfig {
    /// Fully qualified contract name.
    pub contract: String,
    pub value: Option<String>,
    pub name: Option<String>,
    pub service_id: Option<String>,
    pub context_id: Option<String>,
    pub qualifier: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub decode404: bool,
    #[serde(default = "default_primary")]
    pub primary: bool,
}

fn default_primary() -> bool {
    true
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error or an EnvFilter string).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_manifest() {
        let config: RuntimeConfig = toml::from_str("").unwrap();
        assert!(config.client.default_to_properties);
        assert_eq!(config.client.default_config, "default");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_manifest() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [client]
            default_to_properties = false

            [client.config.default]
            logger_level = "basic"

            [client.config.billing]
            connect_timeout_ms = 1000
            read_timeout_ms = 5000
            request_interceptors = ["request-id"]

            [environment]
            "services.billing" = "billing"

            [load_balancing.per_service]
            billing = "least_connections"

            [[services]]
            service = "billing"
            address = "127.0.0.1:7001"

            [[clients]]
            contract = "app::clients::BillingApi"
            value = "${services.billing}"
            "#,
        )
        .unwrap();

        assert!(!config.client.default_to_properties);
        let billing = config.client.section("billing").unwrap();
        assert_eq!(billing.connect_timeout_ms, Some(1000));
        assert_eq!(billing.request_interceptors.as_deref(), Some(&["request-id".to_string()][..]));
        assert_eq!(config.client.section("default").unwrap().logger_level, Some(LoggerLevel::Basic));
        assert_eq!(config.load_balancing.strategy_for("billing"), LoadBalancingStrategy::LeastConnections);
        assert_eq!(config.load_balancing.strategy_for("users"), LoadBalancingStrategy::RoundRobin);
        assert_eq!(config.services[0].max_connections, 100);
        assert!(config.clients[0].primary);
    }
}
