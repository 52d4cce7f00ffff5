//! Lazy, cached Target construction.
//!
//! # Responsibilities
//! - Look up the declaration for a contract name, alias or contextId
//! - Build its Target once: configuration, base URL, transport, targeter
//! - Cache Targets per contextId and release them at shutdown
//!
//! # Design Decisions
//! - One `OnceCell` per contextId; concurrent first callers block on the same build
//! - The map guard is dropped before building so other contextIds are never blocked
//! - A failed build leaves the cell empty

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::config::{ClientProperties, ConfigurationResolver};
use crate::context::ComponentContext;
use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;
use crate::proxy::{HardCodedTarget, RemoteClient, Target, TargetParts, Targeter};
use crate::registry::{naming, ClientDeclaration, ClientSpecificationRegistry};
use crate::transport::TransportSelector;

/// Builds and caches one Target per contextId.
#[derive(Debug)]
pub struct ClientProxyFactory {
    registry: Arc<ClientSpecificationRegistry>,
    context: Arc<ComponentContext>,
    resolver: ConfigurationResolver,
    targets: DashMap<String, Arc<OnceCell<Arc<Target>>>>,
}

impl ClientProxyFactory {
    pub fn new(
        registry: Arc<ClientSpecificationRegistry>,
        context: Arc<ComponentContext>,
        properties: ClientProperties,
    ) -> Self {
        Self {
            registry,
            context,
            resolver: ConfigurationResolver::new(properties),
            targets: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ClientSpecificationRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &Arc<ComponentContext> {
        &self.context
    }

    pub fn resolver(&self) -> &ConfigurationResolver {
        &self.resolver
    }

    /// The Target for a contract name, alias or contextId, built on first use.
    pub fn get_target(&self, key: &str) -> ClientResult<Arc<Target>> {
        let declaration = self
            .registry
            .lookup(key)
            .ok_or_else(|| ClientError::UnknownClient(key.to_string()))?;

        let cell = self
            .targets
            .entry(declaration.context_id.clone())
            .or_default()
            .clone();
        cell.get_or_try_init(|| self.build(&declaration)).cloned()
    }

    /// Typed adapter over the Target of `C`.
    pub fn client<C: RemoteClient>(&self) -> ClientResult<C> {
        Ok(C::from_target(self.get_target(C::CONTRACT)?))
    }

    fn build(&self, declaration: &ClientDeclaration) -> ClientResult<Arc<Target>> {
        let context_id = declaration.context_id.as_str();
        tracing::debug!(context_id = %context_id, contract = %declaration.contract, "Building client target");

        let config = self
            .resolver
            .resolve(context_id, declaration.decode404, &self.context)?;
        let url = naming::base_url(&declaration.service_name, declaration.url.as_deref(), &declaration.path);
        let transport = TransportSelector::select(context_id, declaration.url.as_deref(), &self.context)?;
        let targeter = self
            .context
            .get_required::<Arc<dyn Targeter>>(context_id, "targeter")?;

        let parts = TargetParts {
            hard_coded: HardCodedTarget {
                contract: declaration.contract.clone(),
                name: declaration.service_name.clone(),
                url,
            },
            transport,
            config,
        };
        let target = targeter.target(declaration, parts, &self.context)?;

        metrics::record_target_built(context_id);
        tracing::info!(
            context_id = %context_id,
            url = %target.url(),
            load_balanced = target.transport().is_load_balancing(),
            fallback = target.has_fallback(),
            "Client target built"
        );
        Ok(Arc::new(target))
    }

    /// contextIds whose Target has been built.
    pub fn built_targets(&self) -> Vec<String> {
        let mut built: Vec<String> = self
            .targets
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        built.sort();
        built
    }

    /// Release every Target, cached configuration and component scope.
    pub fn shutdown(&self) {
        let released = self.built_targets().len();
        self.targets.clear();
        self.resolver.clear();
        self.context.close();
        tracing::info!(released, "Client targets released");
    }
}
