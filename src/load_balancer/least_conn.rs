//! Least-connections selection.

use std::sync::Arc;

use crate::load_balancer::{backend::ServiceInstance, LoadBalancer};

/// Picks the selectable instance with the fewest in-flight requests.
/// Ties go to the instance listed first.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, instances: &[Arc<ServiceInstance>]) -> Option<Arc<ServiceInstance>> {
        instances
            .iter()
            .filter(|instance| instance.is_selectable())
            .min_by_key(|instance| instance.in_flight())
            .cloned()
    }
}
