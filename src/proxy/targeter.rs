//! Target construction strategies.

use std::fmt;
use std::sync::Arc;

use crate::config::ResolvedClientConfig;
use crate::context::ComponentContext;
use crate::error::{ClientError, ClientResult};
use crate::fallback::{Fallback, FallbackDispatcher, FallbackFactory, FallbackFactorySpec, FallbackSpec};
use crate::proxy::Target;
use crate::registry::{ClientDeclaration, TypeDescriptor};
use crate::transport::Transport;

/// The (type, name, url) triple a Target is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardCodedTarget {
    pub contract: TypeDescriptor,
    pub name: String,
    pub url: String,
}

/// Everything the factory resolved for one Target.
#[derive(Debug, Clone)]
pub struct TargetParts {
    pub hard_coded: HardCodedTarget,
    pub transport: Arc<dyn Transport>,
    pub config: Arc<ResolvedClientConfig>,
}

/// Turns resolved parts into a Target.
pub trait Targeter: Send + Sync + fmt::Debug {
    fn target(&self, declaration: &ClientDeclaration, parts: TargetParts, context: &ComponentContext)
        -> ClientResult<Target>;
}

/// Builds Targets without any substitution path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTargeter;

impl Targeter for DefaultTargeter {
    fn target(&self, _declaration: &ClientDeclaration, parts: TargetParts, _context: &ComponentContext) -> ClientResult<Target> {
        Ok(Target::new(parts, None))
    }
}

/// Builds Targets with the declaration's fallback or fallback factory attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTargeter;

impl Targeter for FallbackTargeter {
    fn target(&self, declaration: &ClientDeclaration, parts: TargetParts, context: &ComponentContext) -> ClientResult<Target> {
        let context_id = declaration.context_id.as_str();
        let dispatcher = match (&declaration.fallback, &declaration.fallback_factory) {
            (Some(spec), _) => Some(FallbackDispatcher::Static(resolve_fallback(context_id, spec, context)?)),
            (None, Some(spec)) => Some(FallbackDispatcher::Factory(resolve_factory(context_id, spec, context)?)),
            (None, None) => None,
        };
        Ok(Target::new(parts, dispatcher))
    }
}

fn named_in_scope<T: Clone + Send + Sync + 'static>(
    context_id: &str,
    descriptor: &TypeDescriptor,
    context: &ComponentContext,
) -> Option<T> {
    context
        .get_named::<T>(context_id, &descriptor.name)
        .or_else(|| context.get_named::<T>(context_id, &descriptor.canonical_name()))
}

fn resolve_fallback(context_id: &str, spec: &FallbackSpec, context: &ComponentContext) -> ClientResult<Arc<dyn Fallback>> {
    named_in_scope::<Arc<dyn Fallback>>(context_id, &spec.descriptor, context)
        .or_else(|| spec.constructor.as_ref().map(|construct| construct()))
        .ok_or_else(|| ClientError::missing(context_id, format!("fallback {}", spec.descriptor)))
}

fn resolve_factory(
    context_id: &str,
    spec: &FallbackFactorySpec,
    context: &ComponentContext,
) -> ClientResult<Arc<dyn FallbackFactory>> {
    named_in_scope::<Arc<dyn FallbackFactory>>(context_id, &spec.descriptor, context)
        .or_else(|| spec.constructor.as_ref().map(|construct| construct()))
        .ok_or_else(|| ClientError::missing(context_id, format!("fallback factory {}", spec.descriptor)))
}
