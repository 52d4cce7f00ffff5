//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! LoadBalancingTransport extracts the service name from the request host
//!     → pool.rs (instances registered for that service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through healthy instances)
//!         - least_conn.rs (pick instance with fewest in-flight requests)
//!     → backend.rs (guard tracking in-flight requests)
//!     → Return instance guard or None
//! ```
//!
//! # Design Decisions
//! - Algorithms are stateless apart from their own cursor; instances track load
//! - Algorithm selection per service
//! - Unhealthy instances excluded from selection
//! - Health is passive: the transport reports outcomes back to the instance

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

use std::fmt;
use std::sync::Arc;

use crate::load_balancer::backend::{InstanceGuard, ServiceInstance};

pub use backend::HealthState;
pub use pool::ServiceRegistry;

/// Chooses one instance out of a service's instances.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    fn next_server(&self, instances: &[Arc<ServiceInstance>]) -> Option<Arc<ServiceInstance>>;
}

/// Resolves a logical service name to a concrete backend instance.
pub trait ServiceInstanceResolver: Send + Sync + fmt::Debug {
    /// Pick an instance for `service`. The guard releases the instance on drop.
    fn choose(&self, service: &str) -> Option<InstanceGuard>;

    /// Threshold used when reporting outcomes back to instances.
    fn thresholds(&self) -> HealthThresholds {
        HealthThresholds::default()
    }
}

/// Consecutive outcomes needed to flip an instance's health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    pub healthy: usize,
    pub unhealthy: usize,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy: 2,
            unhealthy: 3,
        }
    }
}
