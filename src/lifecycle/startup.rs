//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Register the default specification and scan for client declarations
//! - Install the default transport (load balancer over HTTP)
//! - Build every Target eagerly unless asked not to
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_config, ConfigError, Environment, RuntimeConfig};
use crate::context::{default_components, ComponentContext, ComponentSet};
use crate::lifecycle::ClientRuntime;
use crate::load_balancer::ServiceRegistry;
use crate::proxy::ClientProxyFactory;
use crate::registry::{
    CandidateType, ClientSpecificationRegistry, DiscoverySource, EnablingDeclaration, ScanError, ScanFailure,
    StaticDiscovery,
};
use crate::transport::{HttpTransport, LoadBalancingTransport, Transport};

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("client initialization failed: {}", join(.0))]
    Initialization(Vec<ScanFailure>),
}

fn join(failures: &[ScanFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builder for a `ClientRuntime`.
#[derive(Debug)]
pub struct Bootstrap {
    config: RuntimeConfig,
    environment: Environment,
    enabling: EnablingDeclaration,
    discovery: StaticDiscovery,
    extra_discovery: Option<Arc<dyn DiscoverySource>>,
    parent: ComponentSet,
    eager: bool,
}

impl Bootstrap {
    /// Start from a manifest: its environment, enabling declaration and declared clients.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut environment = Environment::new();
        environment.extend(config.environment.clone());
        let enabling = EnablingDeclaration::from(&config.enable);
        let discovery = StaticDiscovery::from_manifest(&config.clients);

        Self {
            config,
            environment,
            enabling,
            discovery,
            extra_discovery: None,
            parent: default_components(),
            eager: true,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, StartupError> {
        Ok(Self::new(load_config(path)?))
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_enabling(mut self, enabling: EnablingDeclaration) -> Self {
        self.enabling = enabling;
        self
    }

    /// Add a candidate to the manifest's declared clients.
    pub fn with_candidate(mut self, candidate: CandidateType) -> Self {
        self.discovery.push(candidate);
        self
    }

    /// Scan this source instead of the manifest's declared clients.
    pub fn with_discovery(mut self, discovery: Arc<dyn DiscoverySource>) -> Self {
        self.extra_discovery = Some(discovery);
        self
    }

    /// Register a process-wide component.
    pub fn with_component<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.parent.insert(value);
        self
    }

    /// Register a process-wide named component.
    pub fn with_named_component<T: Clone + Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.parent.insert_named(name, value);
        self
    }

    /// Replace the default load-balancing transport.
    pub fn with_transport(self, transport: Arc<dyn Transport>) -> Self {
        self.with_component(transport)
    }

    /// Build Targets on first use instead of at startup.
    pub fn lazy(mut self) -> Self {
        self.eager = false;
        self
    }

    pub fn start(self) -> Result<ClientRuntime, StartupError> {
        let Bootstrap {
            config,
            environment,
            enabling,
            discovery,
            extra_discovery,
            mut parent,
            eager,
        } = self;

        let mut registry = ClientSpecificationRegistry::new(Arc::new(environment));
        registry.register_default(&enabling);
        let report = match &extra_discovery {
            Some(source) => registry.scan_and_register(&enabling, source.as_ref())?,
            None => registry.scan_and_register(&enabling, &discovery)?,
        };

        let mut instances = None;
        if !parent.contains::<Arc<dyn Transport>>() {
            let pool = Arc::new(ServiceRegistry::new(&config.services, &config.load_balancing));
            let transport: Arc<dyn Transport> =
                Arc::new(LoadBalancingTransport::new(Arc::new(HttpTransport::new()), pool.clone()));
            parent.insert(transport);
            instances = Some(pool);
        }

        let context = ComponentContext::new(parent, registry.specifications());
        let registry = Arc::new(registry);
        let factory = ClientProxyFactory::new(registry.clone(), Arc::new(context), config.client.clone());

        if eager {
            let failures: Vec<ScanFailure> = registry
                .declarations()
                .iter()
                .filter_map(|declaration| {
                    factory
                        .get_target(&declaration.context_id)
                        .err()
                        .map(|error| ScanFailure {
                            type_name: declaration.contract.canonical_name(),
                            error,
                        })
                })
                .collect();
            if !failures.is_empty() {
                for failure in &failures {
                    tracing::error!(contract = %failure.type_name, error = %failure.error, "Client initialization failed");
                }
                return Err(StartupError::Initialization(failures));
            }
        }

        tracing::info!(
            clients = registry.len(),
            rejected = report.failures.len(),
            eager,
            "Client runtime started"
        );
        Ok(ClientRuntime {
            factory,
            report,
            instances,
            closed: AtomicBool::new(false),
        })
    }
}
