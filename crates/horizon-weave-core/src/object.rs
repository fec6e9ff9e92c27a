//! Object model for Horizon Weave.
//!
//! Every value a container builds is an [`Object`]: a `Send + Sync` type
//! that accepts property assignments by name and advertises optional
//! capabilities (service, receiver, router, ...) through `as_*` accessors.
//! Objects are shared as [`ObjectRef`] handles.
//!
//! # Key Types
//!
//! - [`Object`] - Base trait that all built objects implement
//! - [`ObjectRef`] - Shared handle to a built object
//! - [`ObjectId`] - Stable identifier of an object in a container's arena
//! - [`ObjectRegistry`] - Arena of built objects plus the named-object table
//!
//! Most types implement [`Object`] with `#[derive(Object)]`, which generates
//! `set_property` from the `#[property]` fields and the capability accessors
//! from `#[object(...)]`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};

use crate::builder::{Configurable, ObjectFactory};
use crate::container::Container;
use crate::error::{PropertyError, PropertyResult};
use crate::lifecycle::{ContainerAware, ContextAware, Service};
use crate::router::{MessageReceiver, MessageRouter};
use crate::value::PropertyValue;

new_key_type! {
    /// A unique identifier for an object in a container's arena.
    ///
    /// Ids stay valid for the life of the container that issued them.
    pub struct ObjectId;
}

impl ObjectId {
    /// Convert the id to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Shared handle to a built object.
pub type ObjectRef = Arc<dyn Object>;

/// Base trait for everything a container builds.
///
/// All methods have defaults, so a bare `impl Object for T {}` gives an
/// object with no configurable properties and no capabilities.
///
/// Property assignment goes through `&self`: objects keep their state in
/// [`Property`](crate::Property) cells or other interior-mutable storage,
/// because they are already shared when the configurer reaches them.
pub trait Object: Any + Send + Sync {
    /// Type name for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Assign a configured property.
    ///
    /// Returns [`PropertyError::NotFound`] for names the object doesn't
    /// recognise.
    fn set_property(&self, name: &str, value: PropertyValue) -> PropertyResult<()> {
        let _ = value;
        Err(PropertyError::NotFound(name.to_owned()))
    }

    /// Names accepted by [`set_property`](Object::set_property).
    fn property_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// The service capability.
    fn as_service(&self) -> Option<&dyn Service> {
        None
    }

    /// The message receiver capability.
    fn as_receiver(&self) -> Option<&dyn MessageReceiver> {
        None
    }

    /// The message router capability.
    fn as_router(&self) -> Option<&dyn MessageRouter> {
        None
    }

    /// The self-configuration capability.
    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }

    /// The container back-reference capability.
    fn as_container_aware(&self) -> Option<&dyn ContainerAware> {
        None
    }

    /// The platform context capability.
    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        None
    }

    /// The object factory capability.
    fn as_factory(&self) -> Option<&dyn ObjectFactory> {
        None
    }

    /// This object as a nested container.
    fn as_container(&self) -> Option<&Container> {
        None
    }
}

impl fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name())
    }
}

/// Safe downcast function for [`Object`] trait objects.
pub fn object_cast<T: Object>(obj: &dyn Object) -> Option<&T> {
    (obj as &dyn Any).downcast_ref::<T>()
}

/// Downcast a shared handle, keeping it shared.
pub fn object_arc_cast<T: Object>(obj: ObjectRef) -> Option<Arc<T>> {
    let any: Arc<dyn Any + Send + Sync> = obj;
    any.downcast::<T>().ok()
}

/// Whether two handles point at the same object.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    object_address(a) == object_address(b)
}

// Identity of the allocation, ignoring vtable metadata.
fn object_address(object: &ObjectRef) -> usize {
    Arc::as_ptr(object) as *const () as usize
}

/// Arena entry for one built object.
struct ObjectEntry {
    object: ObjectRef,
    /// First name the object was bound under, if any.
    name: Option<String>,
    type_name: &'static str,
    /// The object whose configuration created this one.
    owner: Option<ObjectId>,
    children: Vec<ObjectId>,
}

/// State of a configured name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameEntry {
    Bound(ObjectId),
    Failed,
}

/// Arena of built objects plus the named-object table.
///
/// Each container owns one registry. Objects are registered once, when they
/// are instantiated; names are bound once, when their build completes. A
/// name whose build produced nothing is recorded as failed so it is never
/// rebuilt.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: SlotMap<ObjectId, ObjectEntry>,
    names: IndexMap<String, NameEntry>,
    by_address: HashMap<usize, ObjectId>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built object, returning its id.
    ///
    /// Registering the same instance again returns the existing id.
    pub fn register(&mut self, object: ObjectRef, owner: Option<ObjectId>) -> ObjectId {
        let address = object_address(&object);
        if let Some(&id) = self.by_address.get(&address) {
            return id;
        }
        let owner = owner.filter(|owner| self.objects.contains_key(*owner));
        let type_name = object.type_name();
        let id = self.objects.insert(ObjectEntry {
            object,
            name: None,
            type_name,
            owner,
            children: Vec::new(),
        });
        if let Some(owner_entry) = owner.and_then(|owner| self.objects.get_mut(owner)) {
            owner_entry.children.push(id);
        }
        self.by_address.insert(address, id);
        tracing::trace!(target: "horizon_weave_core::container", ?id, type_name, "registered object");
        id
    }

    /// Bind `name` to a registered object. Returns `false` if the name is
    /// already bound or failed, or the id is unknown.
    pub fn bind_name(&mut self, name: &str, id: ObjectId) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        let Some(entry) = self.objects.get_mut(id) else {
            return false;
        };
        if entry.name.is_none() {
            entry.name = Some(name.to_owned());
        }
        self.names.insert(name.to_owned(), NameEntry::Bound(id));
        tracing::trace!(target: "horizon_weave_core::container", name, ?id, "bound name");
        true
    }

    /// Record that building `name` produced no object.
    pub fn mark_failed(&mut self, name: &str) {
        if !self.names.contains_key(name) {
            self.names.insert(name.to_owned(), NameEntry::Failed);
            tracing::trace!(target: "horizon_weave_core::container", name, "recorded failed name");
        }
    }

    /// The object bound to `name`.
    pub fn named(&self, name: &str) -> Option<ObjectRef> {
        self.id_of_name(name).and_then(|id| self.get(id))
    }

    /// Whether `name` has been built, successfully or not.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Whether building `name` produced nothing.
    pub fn is_failed(&self, name: &str) -> bool {
        matches!(self.names.get(name), Some(NameEntry::Failed))
    }

    /// The id bound to `name`.
    pub fn id_of_name(&self, name: &str) -> Option<ObjectId> {
        match self.names.get(name) {
            Some(NameEntry::Bound(id)) => Some(*id),
            _ => None,
        }
    }

    /// The id of a registered instance.
    pub fn id_of(&self, object: &ObjectRef) -> Option<ObjectId> {
        self.by_address.get(&object_address(object)).copied()
    }

    /// The object with this id.
    pub fn get(&self, id: ObjectId) -> Option<ObjectRef> {
        self.objects.get(id).map(|entry| entry.object.clone())
    }

    /// The first name the object was bound under.
    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(id)?.name.as_deref()
    }

    /// The type name recorded at registration.
    pub fn type_name_of(&self, id: ObjectId) -> Option<&'static str> {
        self.objects.get(id).map(|entry| entry.type_name)
    }

    /// The object whose configuration created this one.
    pub fn owner(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.get(id)?.owner
    }

    /// Objects created by this object's configuration, in build order.
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects
            .get(id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    /// Names bound so far, in binding order. Failed names are skipped.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().filter_map(|(name, entry)| match entry {
            NameEntry::Bound(_) => Some(name.as_str()),
            NameEntry::Failed => None,
        })
    }

    /// Number of registered objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects with no owner, in registration order.
    pub fn root_objects(&self) -> Vec<ObjectId> {
        // Nothing is ever removed, so slot order is insertion order.
        self.objects
            .iter()
            .filter(|(_, entry)| entry.owner.is_none())
            .map(|(id, _)| id)
            .collect()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.objects.len())
            .field("names", &self.names.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;

    #[derive(Default)]
    struct Label {
        text: Property<String>,
    }

    impl Object for Label {
        fn set_property(&self, name: &str, value: PropertyValue) -> PropertyResult<()> {
            match name {
                "text" => {
                    self.text.set_silent(crate::FromPropertyValue::from_property_value(value)?);
                    Ok(())
                }
                _ => Err(PropertyError::NotFound(name.to_owned())),
            }
        }
    }

    struct Plain;
    impl Object for Plain {}

    #[test]
    fn test_default_set_property_is_not_found() {
        let plain = Plain;
        assert_eq!(
            plain.set_property("anything", PropertyValue::Null),
            Err(PropertyError::NotFound("anything".into()))
        );
        assert!(plain.as_service().is_none());
    }

    #[test]
    fn test_object_cast() {
        let label: ObjectRef = Arc::new(Label::default());
        label.set_property("text", "hi".into()).unwrap();
        assert_eq!(object_cast::<Label>(label.as_ref()).map(|l| l.text.get()), Some("hi".into()));
        assert!(object_cast::<Plain>(label.as_ref()).is_none());
        assert!(object_arc_cast::<Label>(label.clone()).is_some());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ObjectRegistry::new();
        let label: ObjectRef = Arc::new(Label::default());
        let first = registry.register(label.clone(), None);
        let second = registry.register(label.clone(), None);
        assert_eq!(first, second);
        assert_eq!(registry.object_count(), 1);
        assert_eq!(registry.id_of(&label), Some(first));
    }

    #[test]
    fn test_names_bind_once() {
        let mut registry = ObjectRegistry::new();
        let a: ObjectRef = Arc::new(Plain);
        let b: ObjectRef = Arc::new(Plain);
        let a_id = registry.register(a.clone(), None);
        let b_id = registry.register(b, None);
        assert!(registry.bind_name("a", a_id));
        assert!(!registry.bind_name("a", b_id));
        assert!(registry.bind_name("alias", a_id));
        assert!(same_object(&registry.named("alias").unwrap(), &a));
        assert_eq!(registry.name_of(a_id), Some("a"));

        registry.mark_failed("broken");
        assert!(registry.is_resolved("broken"));
        assert!(registry.is_failed("broken"));
        assert!(registry.named("broken").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "alias"]);
    }

    #[test]
    fn test_ownership_tree() {
        let mut registry = ObjectRegistry::new();
        let window = registry.register(Arc::new(Plain), None);
        let label = registry.register(Arc::new(Label::default()), Some(window));
        let other = registry.register(Arc::new(Plain), None);
        assert_eq!(registry.owner(label), Some(window));
        assert_eq!(registry.children(window), &[label]);
        assert_eq!(registry.root_objects(), vec![window, other]);
        assert!(registry.type_name_of(label).unwrap().ends_with("Label"));
    }
}
