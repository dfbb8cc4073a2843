//! Service resolution for settings and other injected values.
//!
//! The [`ServiceResolver`] contract is the only thing the binder needs from
//! a dependency-injection container. [`ServiceRegistry`] is a small
//! constructor-function registry keyed by [`TypeId`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves instances by type identity.
pub trait ServiceResolver: Send + Sync {
    /// Returns a fresh instance of the type, or `None` if it is not registered.
    fn resolve(&self, type_id: TypeId) -> Option<Box<dyn Any + Send>>;
}

/// Resolves a `T` through `resolver`.
///
/// # Examples
///
/// ```
/// use command_tree_core::{ServiceRegistry, resolve_service};
///
/// let mut services = ServiceRegistry::new();
/// services.register_factory(|| String::from("hello"));
///
/// assert_eq!(resolve_service::<String>(&services).as_deref(), Some("hello"));
/// assert_eq!(resolve_service::<u32>(&services), None);
/// ```
pub fn resolve_service<T: Any + Send>(resolver: &dyn ServiceResolver) -> Option<T> {
    resolver
        .resolve(TypeId::of::<T>())
        .and_then(|instance| instance.downcast::<T>().ok())
        .map(|instance| *instance)
}

/// Resolver with nothing registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServices;

impl ServiceResolver for NoServices {
    fn resolve(&self, _type_id: TypeId) -> Option<Box<dyn Any + Send>> {
        None
    }
}

type ServiceFactory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Registry of constructor functions keyed by type.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    factories: HashMap<TypeId, ServiceFactory>,
    names: HashMap<TypeId, &'static str>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor function for `T`, replacing any previous one.
    pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        self.factories
            .insert(id, Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>));
        self.names.insert(id, std::any::type_name::<T>());
        self
    }

    /// Registers a value that is cloned on every resolution.
    pub fn register_instance<T>(&mut self, instance: T) -> &mut Self
    where
        T: Any + Send + Sync + Clone,
    {
        self.register_factory(move || instance.clone())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ServiceResolver for ServiceRegistry {
    fn resolve(&self, type_id: TypeId) -> Option<Box<dyn Any + Send>> {
        self.factories.get(&type_id).map(|factory| factory())
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.values().copied().collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_runs_per_resolution() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut services = ServiceRegistry::new();
        services.register_factory(move || counter.fetch_add(1, Ordering::SeqCst));

        assert_eq!(resolve_service::<usize>(&services), Some(0));
        assert_eq!(resolve_service::<usize>(&services), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registration_replaces_previous() {
        let mut services = ServiceRegistry::new();
        services.register_instance(1_u8).register_instance(2_u8);

        assert_eq!(services.len(), 1);
        assert!(services.contains::<u8>());
        assert_eq!(resolve_service::<u8>(&services), Some(2));
    }

    #[test]
    fn test_no_services_resolves_nothing() {
        assert!(resolve_service::<String>(&NoServices).is_none());
    }
}
