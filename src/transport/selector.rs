//! Transport selection for a client context.

use std::sync::Arc;

use crate::context::ComponentContext;
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;

/// Picks the transport a Target is built with.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSelector;

impl TransportSelector {
    /// Without a declared URL the transport must load-balance; with one, a
    /// load-balancing transport is unwrapped to its delegate.
    pub fn select(context_id: &str, url: Option<&str>, context: &ComponentContext) -> ClientResult<Arc<dyn Transport>> {
        let transport = context.get_required::<Arc<dyn Transport>>(context_id, "transport")?;

        match url {
            None if transport.is_load_balancing() => Ok(transport),
            None => Err(ClientError::NoLoadBalancer {
                context_id: context_id.to_string(),
            }),
            Some(url) => match transport.load_balanced_delegate() {
                Some(delegate) => {
                    tracing::debug!(context_id = %context_id, url = %url, "Using direct transport for declared URL");
                    Ok(delegate)
                }
                None => Ok(transport),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadBalancingConfig;
    use crate::context::{default_components, ClientConfiguration};
    use crate::load_balancer::ServiceRegistry;
    use crate::registry::ClientSpecification;
    use crate::transport::{HttpTransport, LoadBalancingTransport};

    fn context(transport: Option<Arc<dyn Transport>>) -> ComponentContext {
        let mut parent = default_components();
        if let Some(transport) = transport {
            parent.insert(transport);
        }
        ComponentContext::new(parent, Vec::new())
    }

    fn load_balancing() -> Arc<dyn Transport> {
        let registry = Arc::new(ServiceRegistry::new(&[], &LoadBalancingConfig::default()));
        Arc::new(LoadBalancingTransport::new(Arc::new(HttpTransport::new()), registry))
    }

    #[tokio::test]
    async fn test_no_url_requires_load_balancer() {
        let selected = TransportSelector::select("billing", None, &context(Some(load_balancing()))).unwrap();
        assert!(selected.is_load_balancing());

        let err = TransportSelector::select("billing", None, &context(Some(Arc::new(HttpTransport::new())))).unwrap_err();
        assert_eq!(err, ClientError::NoLoadBalancer { context_id: "billing".into() });
    }

    #[tokio::test]
    async fn test_declared_url_unwraps_load_balancer() {
        let selected = TransportSelector::select("billing", Some("http://localhost:8080"), &context(Some(load_balancing()))).unwrap();
        assert!(!selected.is_load_balancing());

        let selected =
            TransportSelector::select("billing", Some("http://localhost:8080"), &context(Some(Arc::new(HttpTransport::new()))))
                .unwrap();
        assert!(!selected.is_load_balancing());
    }

    #[test]
    fn test_missing_transport() {
        for url in [None, Some("http://localhost:8080")] {
            let err = TransportSelector::select("billing", url, &context(None)).unwrap_err();
            assert_eq!(err, ClientError::missing("billing", "transport"));
        }
    }

    #[tokio::test]
    async fn test_scope_transport_overrides_parent() {
        let parent = {
            let mut parent = default_components();
            parent.insert::<Arc<dyn Transport>>(Arc::new(HttpTransport::new()));
            parent
        };
        let specs = vec![ClientSpecification::new(
            "billing",
            ClientConfiguration::new("BillingConfig").transport(load_balancing()).build(),
        )];
        let context = ComponentContext::new(parent, specs);
        assert!(TransportSelector::select("billing", None, &context).unwrap().is_load_balancing());
        assert!(TransportSelector::select("users", None, &context).is_err());
    }
}
