//! Service instances.
//!
//! # Responsibilities
//! - Hold the routable authority of one instance of a logical service
//! - Bound and count in-flight requests through `InstanceGuard`
//! - Derive health passively from consecutive request outcomes

use std::ops::Deref;
use std::sync::atomic::{AtomicIsize, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use url::Url;

use crate::load_balancer::HealthThresholds;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// No verdict yet; still selectable.
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl HealthState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// One routable instance of a service.
#[derive(Debug)]
pub struct ServiceInstance {
    pub service: String,
    /// `host[:port]`, substituted for the service name in request URLs.
    pub authority: String,
    pub base_url: Url,
    pub max_connections: usize,
    in_flight: AtomicUsize,
    state: AtomicU8,
    /// Positive: consecutive successes. Negative: consecutive failures.
    streak: AtomicIsize,
}

impl ServiceInstance {
    /// `address` is `host:port`, optionally prefixed with a scheme.
    pub fn new(service: impl Into<String>, address: &str, max_connections: usize) -> Result<Self, url::ParseError> {
        let base_url = match address.contains("://") {
            true => Url::parse(address)?,
            false => Url::parse(&format!("http://{}", address))?,
        };
        let host = base_url.host_str().ok_or(url::ParseError::EmptyHost)?;
        let authority = base_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{}:{}", host, port));

        Ok(Self {
            service: service.into(),
            authority,
            base_url,
            max_connections,
            in_flight: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            streak: AtomicIsize::new(0),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Reserve an in-flight slot, unless the instance is at capacity.
    pub fn acquire(self: &Arc<Self>) -> Option<InstanceGuard> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |current| {
                (current < self.max_connections).then_some(current + 1)
            })
            .ok()?;
        Some(InstanceGuard {
            instance: self.clone(),
        })
    }

    pub fn health(&self) -> HealthState {
        HealthState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Anything but `Unhealthy` may be selected.
    pub fn is_selectable(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Record the outcome of one request and return the resulting state.
    pub fn record(&self, success: bool, thresholds: HealthThresholds) -> HealthState {
        let previous = self
            .streak
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |streak| {
                Some(match (success, streak) {
                    (true, s) if s > 0 => s.saturating_add(1),
                    (true, _) => 1,
                    (false, s) if s < 0 => s.saturating_sub(1),
                    (false, _) => -1,
                })
            })
            .unwrap_or(0);
        let streak = match (success, previous) {
            (true, s) if s > 0 => s + 1,
            (true, _) => 1,
            (false, s) if s < 0 => s - 1,
            (false, _) => -1,
        };

        let verdict = if success && streak.unsigned_abs() >= thresholds.healthy {
            Some(HealthState::Healthy)
        } else if !success && streak.unsigned_abs() >= thresholds.unhealthy {
            Some(HealthState::Unhealthy)
        } else {
            None
        };

        if let Some(next) = verdict {
            let before = HealthState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));
            if before != next {
                match next {
                    HealthState::Unhealthy => {
                        tracing::warn!(service = %self.service, instance = %self.authority, "Instance marked unhealthy")
                    }
                    _ => tracing::info!(service = %self.service, instance = %self.authority, "Instance marked healthy"),
                }
            }
        }
        self.health()
    }
}

/// Holds one in-flight slot of an instance until dropped.
#[derive(Debug)]
pub struct InstanceGuard {
    instance: Arc<ServiceInstance>,
}

impl Deref for InstanceGuard {
    type Target = ServiceInstance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.instance.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
