//! Platform context handed to context-aware objects.
//!
//! The core has no knowledge of any platform. An application puts whatever
//! handles its objects need (asset roots, display services, clocks) into a
//! [`Context`] keyed by type, gives it to the root container, and every
//! [`ContextAware`](crate::ContextAware) object receives it after
//! instantiation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed bag of shared platform values.
///
/// Cloning is cheap: clones share the stored values.
#[derive(Clone, Default)]
pub struct Context {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    names: Vec<&'static str>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, replacing any previous value of the same type.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Add a value, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.insert_shared(Arc::new(value));
    }

    /// Add an already shared value, so the caller keeps a handle to it.
    pub fn with_shared<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        self.insert_shared(value);
        self
    }

    /// Add an already shared value, replacing any previous value of the
    /// same type.
    pub fn insert_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        if self.values.insert(TypeId::of::<T>(), value).is_none() {
            self.names.push(std::any::type_name::<T>());
        }
    }

    /// The value of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.values
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Whether a value of type `T` is present.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Whether the context holds nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("values", &self.names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct AssetRoot(String);

    #[test]
    fn test_typed_lookup() {
        let context = Context::new().with(AssetRoot("/srv/assets".into())).with(42u32);
        assert_eq!(context.get::<AssetRoot>().as_deref(), Some(&AssetRoot("/srv/assets".into())));
        assert_eq!(context.get::<u32>().as_deref(), Some(&42));
        assert!(context.get::<String>().is_none());
        assert!(context.contains::<u32>());
    }

    #[test]
    fn test_insert_replaces() {
        let mut context = Context::new();
        context.insert(1u8);
        context.insert(2u8);
        assert_eq!(context.get::<u8>().as_deref(), Some(&2));
        assert_eq!(format!("{context:?}"), "Context { values: [\"u8\"] }");
    }
}
