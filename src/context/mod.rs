//! Per-client component scopes.
//!
//! # Data Flow
//! ```text
//! ClientSpecification[] (from the registry)
//!     → first lookup for a contextId assembles its ComponentScope:
//!         [ own configuration, default.* configurations ]   (most specific first)
//!     → lookups: scope layers → parent ComponentSet → MissingCapability
//! ```
//!
//! # Design Decisions
//! - Scopes never see each other; the parent is the only shared part
//! - Scopes are built lazily and then read-only
//! - Named components (`retryer = "default"`) resolve through the same chain

pub mod components;
pub mod configuration;

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::codec::{Contract, Decoder, DefaultContract, DefaultErrorDecoder, Encoder, ErrorDecoder, JsonDecoder, JsonEncoder};
use crate::error::{ClientError, ClientResult};
use crate::interceptor::{RequestIdInterceptor, RequestInterceptor};
use crate::proxy::{FallbackTargeter, Targeter};
use crate::registry::ClientSpecification;
use crate::resilience::{DefaultRetryer, NeverRetry, Retryer};

pub use components::ComponentSet;
pub use configuration::{ClientConfiguration, ConfigurationRef};

/// Prefix of specifications applied to every scope.
pub const DEFAULT_SPECIFICATION_PREFIX: &str = "default.";

/// Components the process provides to every client unless a scope overrides them.
pub fn default_components() -> ComponentSet {
    let mut parent = ComponentSet::new();

    let encoder: Arc<dyn Encoder> = Arc::new(JsonEncoder);
    let decoder: Arc<dyn Decoder> = Arc::new(JsonDecoder);
    let contract: Arc<dyn Contract> = Arc::new(DefaultContract);
    let error_decoder: Arc<dyn ErrorDecoder> = Arc::new(DefaultErrorDecoder);
    let never: Arc<dyn Retryer> = Arc::new(NeverRetry);
    let default_retryer: Arc<dyn Retryer> = Arc::new(DefaultRetryer::default());
    let targeter: Arc<dyn Targeter> = Arc::new(FallbackTargeter);

    parent.insert(encoder.clone());
    parent.insert(decoder.clone());
    parent.insert(contract.clone());
    parent.insert(error_decoder.clone());
    parent.insert(never.clone());
    parent.insert(targeter);

    parent.insert_named("json", encoder);
    parent.insert_named("json", decoder);
    parent.insert_named("default", contract);
    parent.insert_named("default", error_decoder);
    parent.insert_named("never", never);
    parent.insert_named("default", default_retryer);
    parent.insert_named::<Arc<dyn RequestInterceptor>>("request-id", Arc::new(RequestIdInterceptor));

    parent
}

/// The configuration layers visible to one contextId.
#[derive(Debug)]
pub struct ComponentScope {
    context_id: String,
    /// Most specific first.
    layers: Vec<ConfigurationRef>,
}

impl ComponentScope {
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Configuration names, most specific first.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.layers.iter().find_map(|l| l.components().get::<T>())
    }

    pub fn get_named<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<T> {
        self.layers.iter().find_map(|l| l.components().get_named::<T>(name))
    }

    /// Interceptors of every layer, shared defaults first.
    pub fn interceptors(&self) -> Vec<(String, Arc<dyn RequestInterceptor>)> {
        self.layers
            .iter()
            .rev()
            .flat_map(|l| l.components().interceptors().iter().cloned())
            .collect()
    }
}

/// Lookup service over per-contextId scopes and a shared parent.
#[derive(Debug)]
pub struct ComponentContext {
    parent: ComponentSet,
    specifications: HashMap<String, ConfigurationRef>,
    scopes: DashMap<String, Arc<ComponentScope>>,
}

impl ComponentContext {
    /// Later specifications with the same name replace earlier ones.
    pub fn new(parent: ComponentSet, specifications: impl IntoIterator<Item = ClientSpecification>) -> Self {
        let specifications = specifications
            .into_iter()
            .map(|s| (s.name, s.configuration))
            .collect();
        Self {
            parent,
            specifications,
            scopes: DashMap::new(),
        }
    }

    pub fn with_defaults(specifications: impl IntoIterator<Item = ClientSpecification>) -> Self {
        Self::new(default_components(), specifications)
    }

    pub fn parent(&self) -> &ComponentSet {
        &self.parent
    }

    pub fn scope(&self, context_id: &str) -> Arc<ComponentScope> {
        if let Some(scope) = self.scopes.get(context_id) {
            return scope.clone();
        }
        self.scopes
            .entry(context_id.to_string())
            .or_insert_with(|| Arc::new(self.build_scope(context_id)))
            .clone()
    }

    fn build_scope(&self, context_id: &str) -> ComponentScope {
        let mut layers = Vec::new();
        if let Some(own) = self.specifications.get(context_id) {
            layers.push(own.clone());
        }

        let mut defaults: Vec<(&String, &ConfigurationRef)> = self
            .specifications
            .iter()
            .filter(|(name, _)| name.starts_with(DEFAULT_SPECIFICATION_PREFIX) && name.as_str() != context_id)
            .collect();
        defaults.sort_by(|a, b| a.0.cmp(b.0));
        layers.extend(defaults.into_iter().map(|(_, c)| c.clone()));

        tracing::debug!(
            context_id = %context_id,
            layers = ?layers.iter().map(|l| l.name()).collect::<Vec<_>>(),
            "Component scope created"
        );
        ComponentScope {
            context_id: context_id.to_string(),
            layers,
        }
    }

    /// Scope only, no parent.
    pub fn get_local<T: Clone + Send + Sync + 'static>(&self, context_id: &str) -> Option<T> {
        self.scope(context_id).get::<T>()
    }

    /// Scope, then parent.
    pub fn get_optional<T: Clone + Send + Sync + 'static>(&self, context_id: &str) -> Option<T> {
        self.get_local::<T>(context_id).or_else(|| self.parent.get::<T>())
    }

    pub fn get_required<T: Clone + Send + Sync + 'static>(&self, context_id: &str, capability: &str) -> ClientResult<T> {
        self.get_optional::<T>(context_id)
            .ok_or_else(|| ClientError::missing(context_id, capability))
    }

    pub fn get_named<T: Clone + Send + Sync + 'static>(&self, context_id: &str, name: &str) -> Option<T> {
        self.scope(context_id)
            .get_named::<T>(name)
            .or_else(|| self.parent.get_named::<T>(name))
    }

    pub fn get_named_required<T: Clone + Send + Sync + 'static>(
        &self,
        context_id: &str,
        name: &str,
        capability: &str,
    ) -> ClientResult<T> {
        self.get_named::<T>(context_id, name)
            .ok_or_else(|| ClientError::missing(context_id, format!("{} '{}'", capability, name)))
    }

    /// Code-level interceptors of the scope, in application order.
    pub fn interceptors(&self, context_id: &str) -> Vec<(String, Arc<dyn RequestInterceptor>)> {
        self.scope(context_id).interceptors()
    }

    /// Drop every assembled scope.
    pub fn close(&self) {
        self.scopes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerLevel;
    use crate::transport::Transport;

    fn spec(name: &str, configuration: ClientConfiguration) -> ClientSpecification {
        ClientSpecification::new(name, configuration.build())
    }

    fn context() -> ComponentContext {
        ComponentContext::with_defaults(vec![
            spec("default.app::Application", ClientConfiguration::new("Shared").logger_level(LoggerLevel::Basic)),
            spec(
                "billing",
                ClientConfiguration::new("BillingConfig")
                    .logger_level(LoggerLevel::Full)
                    .interceptor("request-id", Arc::new(RequestIdInterceptor)),
            ),
            spec("users", ClientConfiguration::new("UsersConfig")),
        ])
    }

    #[test]
    fn test_most_specific_wins() {
        let ctx = context();
        assert_eq!(ctx.get_local::<LoggerLevel>("billing"), Some(LoggerLevel::Full));
        assert_eq!(ctx.get_local::<LoggerLevel>("users"), Some(LoggerLevel::Basic));
        assert_eq!(ctx.get_local::<LoggerLevel>("orders"), Some(LoggerLevel::Basic));
        assert_eq!(ctx.scope("billing").layer_names(), vec!["BillingConfig", "Shared"]);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let ctx = context();
        assert_eq!(ctx.interceptors("billing").len(), 1);
        assert!(ctx.interceptors("users").is_empty());
    }

    #[test]
    fn test_parent_fallback_and_missing_capability() {
        let ctx = context();
        assert!(ctx.get_local::<Arc<dyn Encoder>>("users").is_none());
        assert!(ctx.get_required::<Arc<dyn Encoder>>("users", "encoder").is_ok());

        let err = ctx.get_required::<Arc<dyn Transport>>("users", "transport").unwrap_err();
        assert_eq!(err, ClientError::missing("users", "transport"));
        assert!(ctx.get_optional::<Arc<dyn Transport>>("users").is_none());
    }

    #[test]
    fn test_named_components() {
        let ctx = context();
        assert!(ctx.get_named::<Arc<dyn Retryer>>("users", "default").is_some());
        assert!(ctx.get_named::<Arc<dyn RequestInterceptor>>("users", "request-id").is_some());
        let err = ctx
            .get_named_required::<Arc<dyn Retryer>>("users", "aggressive", "retryer")
            .unwrap_err();
        assert_eq!(err.to_string(), "no retryer 'aggressive' found for client context users");
    }

    #[test]
    fn test_scope_is_cached_until_close() {
        let ctx = context();
        let first = ctx.scope("billing");
        assert!(Arc::ptr_eq(&first, &ctx.scope("billing")));
        ctx.close();
        assert!(!Arc::ptr_eq(&first, &ctx.scope("billing")));
    }
}
