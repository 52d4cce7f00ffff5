//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Register default → Scan → Build component context
//!     → Eagerly build every Target (missing capabilities fail startup)
//!
//! Shutdown (shutdown.rs):
//!     Release Targets → Clear resolved configurations → Close scopes
//! ```
//!
//! # Design Decisions
//! - Ordered startup: registration completes before any Target is built
//! - Fail fast: any startup error is fatal
//! - Shutdown is idempotent

pub mod shutdown;
pub mod startup;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::ClientResult;
use crate::load_balancer::ServiceRegistry;
use crate::proxy::{ClientProxyFactory, RemoteClient, Target};
use crate::registry::{ClientSpecificationRegistry, ScanReport};

pub use startup::{Bootstrap, StartupError};

/// A started client runtime: registry, component context and factory.
#[derive(Debug)]
pub struct ClientRuntime {
    factory: ClientProxyFactory,
    report: ScanReport,
    instances: Option<Arc<ServiceRegistry>>,
    closed: AtomicBool,
}

impl ClientRuntime {
    pub fn get_target(&self, key: &str) -> ClientResult<Arc<Target>> {
        self.factory.get_target(key)
    }

    pub fn client<C: RemoteClient>(&self) -> ClientResult<C> {
        self.factory.client::<C>()
    }

    pub fn factory(&self) -> &ClientProxyFactory {
        &self.factory
    }

    pub fn registry(&self) -> &Arc<ClientSpecificationRegistry> {
        self.factory.registry()
    }

    /// Outcome of the startup scan, including rejected declarations.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// The instance pool behind the default load-balancing transport, if it was used.
    pub fn instances(&self) -> Option<&Arc<ServiceRegistry>> {
        self.instances.as_ref()
    }
}
