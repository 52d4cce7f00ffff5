//! Type-keyed component storage.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::interceptor::RequestInterceptor;

type Component = Arc<dyn Any + Send + Sync>;

/// A bag of components keyed by type, optionally by name.
///
/// Components are stored by their handle type: trait objects go in as
/// `Arc<dyn Trait>`, plain values (`LoggerLevel`, `RequestOptions`) as themselves.
/// Lookups clone the handle out.
#[derive(Clone, Default)]
pub struct ComponentSet {
    typed: HashMap<TypeId, Component>,
    named: HashMap<(TypeId, String), Component>,
    interceptors: Vec<(String, Arc<dyn RequestInterceptor>)>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the unnamed component of type `T`, replacing any previous one.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.typed.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|c| (**c).downcast_ref::<T>())
            .cloned()
    }

    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.typed.contains_key(&TypeId::of::<T>())
    }

    /// Insert a component of type `T` under `name`.
    pub fn insert_named<T: Clone + Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) {
        self.named.insert((TypeId::of::<T>(), name.into()), Arc::new(value));
    }

    pub fn get_named<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<T> {
        self.named
            .get(&(TypeId::of::<T>(), name.to_string()))
            .and_then(|c| (**c).downcast_ref::<T>())
            .cloned()
    }

    /// Add an interceptor to the ordered list. It is also reachable by name.
    pub fn add_interceptor(&mut self, name: impl Into<String>, interceptor: Arc<dyn RequestInterceptor>) {
        let name = name.into();
        self.insert_named::<Arc<dyn RequestInterceptor>>(name.clone(), interceptor.clone());
        self.interceptors.push((name, interceptor));
    }

    /// Interceptors in insertion order.
    pub fn interceptors(&self) -> &[(String, Arc<dyn RequestInterceptor>)] {
        &self.interceptors
    }

    /// Number of stored components. Interceptors count through their named entry.
    pub fn len(&self) -> usize {
        self.typed.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.named.keys().map(|(_, n)| n.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("ComponentSet")
            .field("typed", &self.typed.len())
            .field("named", &names)
            .field(
                "interceptors",
                &self.interceptors.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerLevel;
    use crate::interceptor::RequestIdInterceptor;
    use crate::resilience::{DefaultRetryer, NeverRetry, Retryer};

    #[test]
    fn test_typed_lookup() {
        let mut set = ComponentSet::new();
        assert_eq!(set.get::<LoggerLevel>(), None);

        set.insert(LoggerLevel::Full);
        set.insert::<Arc<dyn Retryer>>(Arc::new(NeverRetry));
        assert_eq!(set.get::<LoggerLevel>(), Some(LoggerLevel::Full));
        assert!(set.get::<Arc<dyn Retryer>>().is_some());
        assert!(set.contains::<Arc<dyn Retryer>>());
    }

    #[test]
    fn test_named_lookup_is_per_type() {
        let mut set = ComponentSet::new();
        set.insert_named::<Arc<dyn Retryer>>("default", Arc::new(DefaultRetryer::default()));
        assert!(set.get_named::<Arc<dyn Retryer>>("default").is_some());
        assert!(set.get_named::<Arc<dyn Retryer>>("never").is_none());
        assert!(set.get_named::<Arc<dyn RequestInterceptor>>("default").is_none());
        assert!(set.get::<Arc<dyn Retryer>>().is_none());
    }

    #[test]
    fn test_interceptors_keep_order() {
        let mut set = ComponentSet::new();
        set.add_interceptor("b", Arc::new(RequestIdInterceptor));
        set.add_interceptor("a", Arc::new(RequestIdInterceptor));
        let names: Vec<&str> = set.interceptors().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(set.get_named::<Arc<dyn RequestInterceptor>>("a").is_some());
    }

    #[test]
    fn test_len_counts_interceptors_once() {
        let mut set = ComponentSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);

        set.add_interceptor("request-id", Arc::new(RequestIdInterceptor));
        set.add_interceptor("request-id", Arc::new(RequestIdInterceptor));
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        assert_eq!(set.interceptors().len(), 2);

        set.insert(LoggerLevel::Basic);
        assert_eq!(set.len(), 2);
    }
}
