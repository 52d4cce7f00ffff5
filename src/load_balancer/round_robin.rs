//! Round-robin selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::ServiceInstance, LoadBalancer};

/// Rotates through the instances, skipping unselectable ones.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, instances: &[Arc<ServiceInstance>]) -> Option<Arc<ServiceInstance>> {
        if instances.is_empty() {
            return None;
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % instances.len();

        // at most one lap, so a fully unhealthy service yields None
        instances[start..]
            .iter()
            .chain(&instances[..start])
            .find(|instance| instance.is_selectable())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::HealthThresholds;

    const TRIP: HealthThresholds = HealthThresholds { healthy: 1, unhealthy: 1 };

    fn instance(addr: &str) -> Arc<ServiceInstance> {
        Arc::new(ServiceInstance::new("billing", addr, 100).unwrap())
    }

    #[test]
    fn test_rotation() {
        let lb = RoundRobin::new();
        let instances = vec![instance("127.0.0.1:7001"), instance("127.0.0.1:7002")];

        let picked: Vec<String> = (0..3)
            .map(|_| lb.next_server(&instances).unwrap().authority.clone())
            .collect();
        assert_eq!(picked, vec!["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7001"]);
    }

    #[test]
    fn test_skips_unhealthy() {
        let lb = RoundRobin::new();
        let down = instance("127.0.0.1:7001");
        let up = instance("127.0.0.1:7002");
        down.record(false, TRIP);
        let instances = vec![down, up.clone()];

        for _ in 0..3 {
            assert_eq!(lb.next_server(&instances).unwrap().authority, up.authority);
        }

        up.record(false, TRIP);
        assert!(lb.next_server(&instances).is_none());
    }
}
