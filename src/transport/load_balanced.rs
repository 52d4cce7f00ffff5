//! Load-balancing transport decorator.
//!
//! # Responsibilities
//! - Treat the request host as a logical service name
//! - Strip it and rebuild the URL against a chosen instance
//! - Report outcomes back to the instance (passive health)

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::load_balancer::{HealthState, ServiceInstanceResolver};
use crate::observability::metrics;
use crate::transport::{Request, RequestOptions, Response, Transport};

/// Remove `host` from the authority of `url`.
///
/// `https://svc/a` → `https:///a`; `http://svc` → `http:///`.
pub fn clean_url(url: &str, host: &str) -> String {
    let prefix = if url.starts_with("https://") {
        8
    } else if url.starts_with("http://") {
        7
    } else {
        return url.to_string();
    };

    let Some(rest) = url.get(prefix + host.len()..) else {
        return url.to_string();
    };
    let mut cleaned = format!("{}{}", &url[..prefix], rest);
    if cleaned.len() == prefix {
        cleaned.push('/');
    }
    cleaned
}

/// Resolves the service named by the request host to a concrete instance.
#[derive(Debug)]
pub struct LoadBalancingTransport {
    delegate: Arc<dyn Transport>,
    resolver: Arc<dyn ServiceInstanceResolver>,
}

impl LoadBalancingTransport {
    pub fn new(delegate: Arc<dyn Transport>, resolver: Arc<dyn ServiceInstanceResolver>) -> Self {
        Self { delegate, resolver }
    }

    pub fn resolver(&self) -> &Arc<dyn ServiceInstanceResolver> {
        &self.resolver
    }
}

#[async_trait]
impl Transport for LoadBalancingTransport {
    async fn execute(&self, mut request: Request, options: &RequestOptions) -> Result<Response, TransportError> {
        let parsed = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", request.url, e)))?;
        let service = parsed
            .host_str()
            .ok_or_else(|| TransportError::InvalidRequest(format!("{} has no host", request.url)))?
            .to_string();

        let instance = self
            .resolver
            .choose(&service)
            .ok_or_else(|| TransportError::NoInstance { service: service.clone() })?;

        let cleaned = clean_url(&request.url, &service);
        let rest = cleaned.split_once("://").map_or("/", |(_, rest)| rest);
        // a declared port belongs to the logical name, not the instance
        let rest = match rest.strip_prefix(':') {
            Some(port_and_path) => port_and_path.find(['/', '?']).map_or("/", |i| &port_and_path[i..]),
            None => rest,
        };
        let scheme = if instance.base_url.scheme() == "https" { "https" } else { parsed.scheme() };
        let routed = format!("{}://{}{}", scheme, instance.authority, rest);
        let original = std::mem::replace(&mut request.url, routed);
        tracing::debug!(service = %service, from = %original, to = %request.url, "Request routed to instance");

        let thresholds = self.resolver.thresholds();
        let result = self.delegate.execute(request, options).await;
        if let Err(e) = &result {
            tracing::debug!(service = %service, instance = %instance.authority, error = %e, "Instance request failed");
        }
        let state = instance.record(result.is_ok(), thresholds);
        metrics::record_instance_health(&service, &instance.authority, state != HealthState::Unhealthy);
        result
    }

    fn load_balanced_delegate(&self) -> Option<Arc<dyn Transport>> {
        Some(self.delegate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoadBalancingConfig, ServiceInstanceConfig};
    use crate::load_balancer::ServiceRegistry;
    use reqwest::{Method, StatusCode};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recording {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Recording {
        async fn execute(&self, request: Request, _options: &RequestOptions) -> Result<Response, TransportError> {
            self.urls.lock().unwrap().push(request.url.clone());
            Ok(Response::new(StatusCode::OK, ""))
        }
    }

    fn registry(addresses: &[&str]) -> Arc<ServiceRegistry> {
        let configs: Vec<ServiceInstanceConfig> = addresses
            .iter()
            .map(|a| ServiceInstanceConfig {
                service: "billing".into(),
                address: a.to_string(),
                max_connections: 10,
            })
            .collect();
        Arc::new(ServiceRegistry::new(&configs, &LoadBalancingConfig::default()))
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(clean_url("https://svc.example.com/a/b", "svc.example.com"), "https:///a/b");
        assert_eq!(clean_url("http://svc.example.com", "svc.example.com"), "http:///");
        assert_eq!(clean_url("http://svc/a?x=1", "svc"), "http:///a?x=1");
        assert_eq!(clean_url("ftp://svc/a", "svc"), "ftp://svc/a");
    }

    #[tokio::test]
    async fn test_rewrites_to_instances_in_turn() {
        let recording = Arc::new(Recording::default());
        let transport = LoadBalancingTransport::new(recording.clone(), registry(&["127.0.0.1:7001", "127.0.0.1:7002"]));

        for _ in 0..2 {
            let request = Request::new(Method::GET, "http://billing/api/invoices?state=open");
            transport.execute(request, &RequestOptions::default()).await.unwrap();
        }
        let request = Request::new(Method::GET, "http://billing");
        transport.execute(request, &RequestOptions::default()).await.unwrap();
        let request = Request::new(Method::GET, "http://billing:9000/health");
        transport.execute(request, &RequestOptions::default()).await.unwrap();

        let urls = recording.urls.lock().unwrap().clone();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:7001/api/invoices?state=open",
                "http://127.0.0.1:7002/api/invoices?state=open",
                "http://127.0.0.1:7001/",
                "http://127.0.0.1:7002/health",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let transport = LoadBalancingTransport::new(Arc::new(Recording::default()), registry(&["127.0.0.1:7001"]));
        let err = transport
            .execute(Request::new(Method::GET, "http://users/"), &RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::NoInstance { service: "users".into() });
    }

    #[test]
    fn test_exposes_delegate() {
        let transport = LoadBalancingTransport::new(Arc::new(Recording::default()), registry(&[]));
        assert!(transport.is_load_balancing());
        assert!(!transport.load_balanced_delegate().unwrap().is_load_balancing());
    }
}
