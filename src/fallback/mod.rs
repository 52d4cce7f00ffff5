//! Fallback substitution.
//!
//! # Data Flow
//! ```text
//! Target::invoke fails with ClientError::Transport(cause)
//!     → FallbackDispatcher::Static   → fallback.invoke(method, args)
//!     → FallbackDispatcher::Factory  → factory.create(cause).invoke(method, args)
//!     → no dispatcher                → error returned unchanged
//! ```
//!
//! # Design Decisions
//! - Only transport failures are substituted; status and codec errors are not
//! - A fallback is resolved once, when the Target is built

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::codec::{Arguments, MethodMetadata};
use crate::error::{ClientResult, TransportError};
use crate::registry::TypeDescriptor;

/// Answers calls in place of the remote service.
#[async_trait]
pub trait Fallback: Send + Sync + fmt::Debug {
    async fn invoke(&self, method: &MethodMetadata, args: &Arguments) -> ClientResult<Value>;
}

/// Produces a fallback for a specific failure.
pub trait FallbackFactory: Send + Sync + fmt::Debug {
    fn create(&self, cause: &TransportError) -> Arc<dyn Fallback>;
}

pub type FallbackConstructor = Arc<dyn Fn() -> Arc<dyn Fallback> + Send + Sync>;
pub type FallbackFactoryConstructor = Arc<dyn Fn() -> Arc<dyn FallbackFactory> + Send + Sync>;

/// A declared fallback type.
#[derive(Clone)]
pub struct FallbackSpec {
    pub descriptor: TypeDescriptor,
    /// No-argument constructor, used when no instance is registered in scope.
    pub constructor: Option<FallbackConstructor>,
}

impl FallbackSpec {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            constructor: None,
        }
    }

    /// Concrete fallback built with `F::default()`.
    pub fn of<F: Fallback + Default + 'static>(type_name: impl Into<String>) -> Self {
        let constructor: FallbackConstructor = Arc::new(|| Arc::new(F::default()) as Arc<dyn Fallback>);
        Self {
            descriptor: TypeDescriptor::concrete(type_name),
            constructor: Some(constructor),
        }
    }

    pub fn with_constructor(mut self, constructor: FallbackConstructor) -> Self {
        self.constructor = Some(constructor);
        self
    }
}

impl fmt::Debug for FallbackSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackSpec")
            .field("descriptor", &self.descriptor)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

/// A declared fallback factory type.
#[derive(Clone)]
pub struct FallbackFactorySpec {
    pub descriptor: TypeDescriptor,
    /// The type of fallback the factory produces.
    pub produces: TypeDescriptor,
    pub constructor: Option<FallbackFactoryConstructor>,
}

impl FallbackFactorySpec {
    pub fn new(descriptor: TypeDescriptor, produces: TypeDescriptor) -> Self {
        Self {
            descriptor,
            produces,
            constructor: None,
        }
    }

    pub fn of<F: FallbackFactory + Default + 'static>(
        type_name: impl Into<String>,
        produces: impl Into<String>,
    ) -> Self {
        let constructor: FallbackFactoryConstructor =
            Arc::new(|| Arc::new(F::default()) as Arc<dyn FallbackFactory>);
        Self {
            descriptor: TypeDescriptor::concrete(type_name),
            produces: TypeDescriptor::concrete(produces),
            constructor: Some(constructor),
        }
    }

    pub fn with_constructor(mut self, constructor: FallbackFactoryConstructor) -> Self {
        self.constructor = Some(constructor);
        self
    }
}

impl fmt::Debug for FallbackFactorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackFactorySpec")
            .field("descriptor", &self.descriptor)
            .field("produces", &self.produces)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

/// The substitution path of one Target.
#[derive(Debug, Clone)]
pub enum FallbackDispatcher {
    Static(Arc<dyn Fallback>),
    Factory(Arc<dyn FallbackFactory>),
}

impl FallbackDispatcher {
    pub async fn dispatch(
        &self,
        method: &MethodMetadata,
        args: &Arguments,
        cause: &TransportError,
    ) -> ClientResult<Value> {
        match self {
            FallbackDispatcher::Static(fallback) => fallback.invoke(method, args).await,
            FallbackDispatcher::Factory(factory) => factory.create(cause).invoke(method, args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Cached;

    #[async_trait]
    impl Fallback for Cached {
        async fn invoke(&self, method: &MethodMetadata, _args: &Arguments) -> ClientResult<Value> {
            Ok(json!({"fallback": method.name}))
        }
    }

    #[derive(Debug)]
    struct Explaining(String);

    #[async_trait]
    impl Fallback for Explaining {
        async fn invoke(&self, _method: &MethodMetadata, _args: &Arguments) -> ClientResult<Value> {
            Ok(json!({"cause": self.0}))
        }
    }

    #[derive(Debug, Default)]
    struct ExplainingFactory;

    impl FallbackFactory for ExplainingFactory {
        fn create(&self, cause: &TransportError) -> Arc<dyn Fallback> {
            Arc::new(Explaining(cause.to_string()))
        }
    }

    fn cause() -> TransportError {
        TransportError::NoInstance { service: "billing".into() }
    }

    #[tokio::test]
    async fn test_static_dispatch() {
        let spec = FallbackSpec::of::<Cached>("app::BillingFallback");
        let fallback = (spec.constructor.unwrap())();
        let dispatcher = FallbackDispatcher::Static(fallback);
        let value = dispatcher
            .dispatch(&MethodMetadata::get("invoice", "/"), &Arguments::new(), &cause())
            .await
            .unwrap();
        assert_eq!(value, json!({"fallback": "invoice"}));
    }

    #[tokio::test]
    async fn test_factory_sees_cause() {
        let spec = FallbackFactorySpec::of::<ExplainingFactory>("app::BillingFallbackFactory", "app::Explaining");
        let dispatcher = FallbackDispatcher::Factory((spec.constructor.unwrap())());
        let value = dispatcher
            .dispatch(&MethodMetadata::get("invoice", "/"), &Arguments::new(), &cause())
            .await
            .unwrap();
        assert_eq!(value, json!({"cause": "no available instance for service billing"}));
    }
}
