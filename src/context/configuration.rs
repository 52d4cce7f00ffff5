//! Code-level client configuration bundles.

use std::sync::Arc;

use crate::codec::{Contract, Decoder, Encoder, ErrorDecoder};
use crate::config::LoggerLevel;
use crate::context::ComponentSet;
use crate::fallback::{Fallback, FallbackFactory};
use crate::interceptor::RequestInterceptor;
use crate::proxy::Targeter;
use crate::resilience::Retryer;
use crate::transport::{RequestOptions, Transport};

/// Shared handle to a configuration bundle.
pub type ConfigurationRef = Arc<ClientConfiguration>;

/// A named set of components contributed to one or more client scopes.
#[derive(Debug, Clone, Default)]
pub struct ClientConfiguration {
    name: String,
    components: ComponentSet,
}

impl ClientConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: ComponentSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    pub fn with<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.components.insert(value);
        self
    }

    pub fn with_named<T: Clone + Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.components.insert_named(name, value);
        self
    }

    pub fn logger_level(self, level: LoggerLevel) -> Self {
        self.with(level)
    }

    pub fn options(self, options: RequestOptions) -> Self {
        self.with(options)
    }

    pub fn retryer(self, retryer: Arc<dyn Retryer>) -> Self {
        self.with(retryer)
    }

    pub fn error_decoder(self, decoder: Arc<dyn ErrorDecoder>) -> Self {
        self.with(decoder)
    }

    pub fn encoder(self, encoder: Arc<dyn Encoder>) -> Self {
        self.with(encoder)
    }

    pub fn decoder(self, decoder: Arc<dyn Decoder>) -> Self {
        self.with(decoder)
    }

    pub fn contract(self, contract: Arc<dyn Contract>) -> Self {
        self.with(contract)
    }

    pub fn transport(self, transport: Arc<dyn Transport>) -> Self {
        self.with(transport)
    }

    pub fn targeter(self, targeter: Arc<dyn Targeter>) -> Self {
        self.with(targeter)
    }

    /// Register a fallback instance under its type name.
    pub fn fallback(self, type_name: impl Into<String>, fallback: Arc<dyn Fallback>) -> Self {
        self.with_named(type_name, fallback)
    }

    /// Register a fallback factory instance under its type name.
    pub fn fallback_factory(self, type_name: impl Into<String>, factory: Arc<dyn FallbackFactory>) -> Self {
        self.with_named(type_name, factory)
    }

    pub fn interceptor(mut self, name: impl Into<String>, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.components.add_interceptor(name, interceptor);
        self
    }

    pub fn build(self) -> ConfigurationRef {
        Arc::new(self)
    }
}
