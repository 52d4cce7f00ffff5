//! Service instance pool.
//!
//! # Responsibilities
//! - Manage instances grouped by service name
//! - Apply the configured load balancing algorithm per service
//! - Provide guards for in-flight tracking

use std::collections::HashMap;
use std::sync::Arc;
use crate::config::{LoadBalancingConfig, LoadBalancingStrategy, ServiceInstanceConfig};
use crate::load_balancer::{
    HealthThresholds, LoadBalancer, ServiceInstanceResolver,
    backend::{InstanceGuard, ServiceInstance},
    least_conn::LeastConnections,
    round_robin::RoundRobin,
};

/// A service's instances with the algorithm choosing among them.
#[derive(Debug)]
struct ServicePool {
    instances: Vec<Arc<ServiceInstance>>,
    balancer: Box<dyn LoadBalancer>,
}

/// Static registry of service instances. Implements the load-balancer capability.
#[derive(Debug)]
pub struct ServiceRegistry {
    services: HashMap<String, ServicePool>,
    thresholds: HealthThresholds,
}

impl ServiceRegistry {
    /// Build the registry from configuration. Invalid addresses are skipped.
    pub fn new(configs: &[ServiceInstanceConfig], lb: &LoadBalancingConfig) -> Self {
        let mut grouped: HashMap<String, Vec<Arc<ServiceInstance>>> = HashMap::new();

        for config in configs {
            match ServiceInstance::new(config.service.clone(), &config.address, config.max_connections) {
                Ok(instance) => grouped
                    .entry(config.service.clone())
                    .or_default()
                    .push(Arc::new(instance)),
                Err(e) => {
                    tracing::warn!(service = %config.service, address = %config.address, error = %e, "Invalid instance address");
                }
            }
        }

        let services = grouped
            .into_iter()
            .map(|(name, instances)| {
                let strategy = lb.strategy_for(&name);
                let balancer: Box<dyn LoadBalancer> = match strategy {
                    LoadBalancingStrategy::RoundRobin => Box::new(RoundRobin::new()),
                    LoadBalancingStrategy::LeastConnections => Box::new(LeastConnections::new()),
                };
                tracing::debug!(service = %name, instances = instances.len(), strategy = ?strategy, "Service pool ready");
                (name, ServicePool { instances, balancer })
            })
            .collect();

        Self {
            services,
            thresholds: HealthThresholds {
                healthy: lb.healthy_threshold,
                unhealthy: lb.unhealthy_threshold,
            },
        }
    }

    /// All instances (for reporting).
    pub fn all_instances(&self) -> Vec<Arc<ServiceInstance>> {
        self.services
            .values()
            .flat_map(|pool| pool.instances.iter())
            .cloned()
            .collect()
    }

    /// Names of services with at least one instance.
    pub fn services(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }
}

impl ServiceInstanceResolver for ServiceRegistry {
    fn choose(&self, service: &str) -> Option<InstanceGuard> {
        // Hosts come out of URL parsing lowercased
        let pool = self.services.get(service).or_else(|| {
            self.services
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(service))
                .map(|(_, pool)| pool)
        });

        let Some(pool) = pool else {
            tracing::debug!(service = %service, "Service not found in registry");
            return None;
        };

        match pool.balancer.next_server(&pool.instances) {
            Some(instance) => instance.acquire(),
            None => {
                tracing::debug!(service = %service, instance_count = pool.instances.len(), "No healthy instances found");
                for i in &pool.instances {
                    tracing::debug!(authority = %i.authority, state = ?i.health(), "Instance status");
                }
                None
            }
        }
    }

    fn thresholds(&self) -> HealthThresholds {
        self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(service: &str, address: &str) -> ServiceInstanceConfig {
        ServiceInstanceConfig {
            service: service.into(),
            address: address.into(),
            max_connections: 10,
        }
    }

    #[test]
    fn test_groups_by_service() {
        let registry = ServiceRegistry::new(
            &[
                instance("billing", "127.0.0.1:7001"),
                instance("billing", "127.0.0.1:7002"),
                instance("users", "127.0.0.1:7003"),
                instance("users", "not a url:::"),
            ],
            &LoadBalancingConfig::default(),
        );

        assert_eq!(registry.all_instances().len(), 3);
        let first = registry.choose("billing").unwrap();
        let second = registry.choose("billing").unwrap();
        assert_ne!(first.authority, second.authority);
        assert_eq!(registry.choose("users").unwrap().authority, "127.0.0.1:7003");
        assert!(registry.choose("unknown").is_none());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let registry = ServiceRegistry::new(&[instance("Billing", "127.0.0.1:7001")], &LoadBalancingConfig::default());
        assert!(registry.choose("billing").is_some());
    }
}
