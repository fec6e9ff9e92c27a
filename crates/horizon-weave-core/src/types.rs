//! Type and class registries.
//!
//! Object definitions name what to build either by short type (`*type`) or
//! by class (`*and-class`). The [`TypeRegistry`] maps type names to class
//! names, and class names to a [`ClassEntry`] holding the constructors used
//! to instantiate them.
//!
//! A class may register up to three constructors. Instantiation uses the
//! first one present, in this order:
//!
//! 1. a context constructor, given the container's platform [`Context`]
//! 2. a configuration constructor, given the object's definition
//! 3. a no-argument constructor

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Configuration;
use crate::container::Container;
use crate::context::Context;
use crate::object::{Object, ObjectRef};

/// Class name of the builtin nested container.
pub const CONTAINER_CLASS: &str = "horizon_weave.Container";
/// Type name mapped to [`CONTAINER_CLASS`] in every registry.
pub const CONTAINER_TYPE: &str = "container";

type ContextConstructor = Arc<dyn Fn(&Context) -> ObjectRef + Send + Sync>;
type ConfigurationConstructor = Arc<dyn Fn(&Configuration) -> ObjectRef + Send + Sync>;
type NoArgsConstructor = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// Constructors registered for one class.
#[derive(Clone, Default)]
pub struct ClassEntry {
    with_context: Option<ContextConstructor>,
    with_configuration: Option<ConfigurationConstructor>,
    no_args: Option<NoArgsConstructor>,
}

impl ClassEntry {
    /// An entry with no constructors.
    pub fn new() -> Self {
        Self::default()
    }

    /// An entry built with `T::default()`.
    pub fn of_default<T: Object + Default>() -> Self {
        Self::no_args(T::default)
    }

    /// An entry with a no-argument constructor.
    pub fn no_args<T, F>(constructor: F) -> Self
    where
        T: Object,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new().and_no_args(constructor)
    }

    /// An entry with a context constructor.
    pub fn with_context<T, F>(constructor: F) -> Self
    where
        T: Object,
        F: Fn(&Context) -> T + Send + Sync + 'static,
    {
        Self::new().and_context(constructor)
    }

    /// An entry with a configuration constructor.
    pub fn with_configuration<T, F>(constructor: F) -> Self
    where
        T: Object,
        F: Fn(&Configuration) -> T + Send + Sync + 'static,
    {
        Self::new().and_configuration(constructor)
    }

    /// Add a no-argument constructor.
    pub fn and_no_args<T, F>(mut self, constructor: F) -> Self
    where
        T: Object,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.no_args = Some(Arc::new(move || Arc::new(constructor()) as ObjectRef));
        self
    }

    /// Add a context constructor.
    pub fn and_context<T, F>(mut self, constructor: F) -> Self
    where
        T: Object,
        F: Fn(&Context) -> T + Send + Sync + 'static,
    {
        self.with_context = Some(Arc::new(move |context: &Context| {
            Arc::new(constructor(context)) as ObjectRef
        }));
        self
    }

    /// Add a configuration constructor.
    pub fn and_configuration<T, F>(mut self, constructor: F) -> Self
    where
        T: Object,
        F: Fn(&Configuration) -> T + Send + Sync + 'static,
    {
        self.with_configuration = Some(Arc::new(move |configuration: &Configuration| {
            Arc::new(constructor(configuration)) as ObjectRef
        }));
        self
    }

    /// Add a context constructor that returns an already shared object.
    pub fn and_context_shared<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Context) -> ObjectRef + Send + Sync + 'static,
    {
        self.with_context = Some(Arc::new(constructor));
        self
    }

    /// Whether any constructor is registered.
    pub fn has_constructor(&self) -> bool {
        self.with_context.is_some() || self.with_configuration.is_some() || self.no_args.is_some()
    }

    /// Instantiate with the first registered constructor.
    pub fn instantiate(&self, context: &Context, configuration: &Configuration) -> Option<ObjectRef> {
        if let Some(constructor) = &self.with_context {
            return Some(constructor(context));
        }
        if let Some(constructor) = &self.with_configuration {
            return Some(constructor(configuration));
        }
        self.no_args.as_ref().map(|constructor| constructor())
    }
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("with_context", &self.with_context.is_some())
            .field("with_configuration", &self.with_configuration.is_some())
            .field("no_args", &self.no_args.is_some())
            .finish()
    }
}

/// Type name and class name registry.
#[derive(Clone)]
pub struct TypeRegistry {
    types: Configuration,
    classes: HashMap<String, ClassEntry>,
}

impl TypeRegistry {
    /// A registry holding only the builtin `container` type.
    pub fn new() -> Self {
        let mut registry = Self {
            types: builtin_types(),
            classes: HashMap::new(),
        };
        registry.register_class(
            CONTAINER_CLASS,
            ClassEntry::new()
                .and_context_shared(|context| Container::with_context(context.clone()) as ObjectRef),
        );
        registry
    }

    /// Register constructors under a class name, replacing any previous entry.
    pub fn register_class(&mut self, class_name: impl Into<String>, entry: ClassEntry) {
        let class_name = class_name.into();
        tracing::trace!(target: "horizon_weave_core::config", class_name, "registered class");
        self.classes.insert(class_name, entry);
    }

    /// Map a type name to a class name.
    pub fn register_type(&mut self, type_name: &str, class_name: &str) {
        let mut mapping = Map::new();
        mapping.insert(type_name.to_owned(), Value::String(class_name.to_owned()));
        self.add_types(&Configuration::new(Value::Object(mapping)));
    }

    /// Register constructors under a class named after the type, and map the
    /// type to it.
    pub fn register(&mut self, type_name: &str, entry: ClassEntry) {
        self.register_class(type_name, entry);
        self.register_type(type_name, type_name);
    }

    /// Merge further type mappings over the current ones.
    pub fn add_types(&mut self, types: &Configuration) {
        self.types = self.types.mixin(types);
    }

    /// Replace the type mappings. The builtin `container` type is kept unless
    /// `types` remaps it.
    pub fn set_types(&mut self, types: &Configuration) {
        self.types = builtin_types().mixin(types);
    }

    /// The type mappings.
    pub fn types(&self) -> &Configuration {
        &self.types
    }

    /// The class mapped to a type name.
    pub fn class_for_type(&self, type_name: &str) -> Option<&str> {
        match self.types.root() {
            Value::Object(map) => map.get(type_name)?.as_str(),
            _ => None,
        }
    }

    /// The constructors registered for a class.
    pub fn class(&self, class_name: &str) -> Option<&ClassEntry> {
        self.classes.get(class_name)
    }

    /// Put `parent`'s mappings and classes beneath this registry's own.
    pub fn inherit(&mut self, parent: &TypeRegistry) {
        self.types = parent.types.mixin(&self.types);
        for (class_name, entry) in &parent.classes {
            self.classes
                .entry(class_name.clone())
                .or_insert_with(|| entry.clone());
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&String> = self.classes.keys().collect();
        classes.sort();
        f.debug_struct("TypeRegistry")
            .field("types", &self.types)
            .field("classes", &classes)
            .finish()
    }
}

fn builtin_types() -> Configuration {
    let mut mapping = Map::new();
    mapping.insert(CONTAINER_TYPE.to_owned(), Value::String(CONTAINER_CLASS.to_owned()));
    Configuration::new(Value::Object(mapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::object_cast;
    use serde_json::json;

    #[derive(Default)]
    struct Origin {
        origin: &'static str,
    }
    impl Object for Origin {}

    fn origin(object: &ObjectRef) -> &'static str {
        object_cast::<Origin>(object.as_ref()).map(|p| p.origin).unwrap_or("?")
    }

    #[test]
    fn test_constructor_precedence() {
        let context = Context::new();
        let config = Configuration::empty();

        let all = ClassEntry::no_args(|| Origin { origin: "no-args" })
            .and_configuration(|_| Origin { origin: "configuration" })
            .and_context(|_| Origin { origin: "context" });
        assert_eq!(origin(&all.instantiate(&context, &config).unwrap()), "context");

        let two = ClassEntry::no_args(|| Origin { origin: "no-args" })
            .and_configuration(|_| Origin { origin: "configuration" });
        assert_eq!(origin(&two.instantiate(&context, &config).unwrap()), "configuration");

        let one = ClassEntry::of_default::<Origin>();
        assert_eq!(origin(&one.instantiate(&context, &config).unwrap()), "");

        assert!(ClassEntry::new().instantiate(&context, &config).is_none());
        assert!(!ClassEntry::new().has_constructor());
    }

    #[test]
    fn test_type_mapping() {
        let mut registry = TypeRegistry::new();
        registry.register("logger", ClassEntry::of_default::<Origin>());
        registry.register_type("log", "logger");
        assert_eq!(registry.class_for_type("logger"), Some("logger"));
        assert_eq!(registry.class_for_type("log"), Some("logger"));
        assert_eq!(registry.class_for_type(CONTAINER_TYPE), Some(CONTAINER_CLASS));
        assert!(registry.class("logger").is_some());
        assert!(registry.class_for_type("missing").is_none());
    }

    #[test]
    fn test_set_types_keeps_builtin() {
        let mut registry = TypeRegistry::new();
        registry.add_types(&Configuration::new(json!({"a": "A"})));
        registry.set_types(&Configuration::new(json!({"b": "B"})));
        assert!(registry.class_for_type("a").is_none());
        assert_eq!(registry.class_for_type("b"), Some("B"));
        assert_eq!(registry.class_for_type(CONTAINER_TYPE), Some(CONTAINER_CLASS));
    }

    #[test]
    fn test_inherit_keeps_own_mappings_on_top() {
        let mut parent = TypeRegistry::new();
        parent.register("view", ClassEntry::of_default::<Origin>());
        parent.register_type("label", "ParentLabel");

        let mut child = TypeRegistry::new();
        child.register_type("label", "ChildLabel");
        child.inherit(&parent);

        assert_eq!(child.class_for_type("label"), Some("ChildLabel"));
        assert_eq!(child.class_for_type("view"), Some("view"));
        assert!(child.class("view").is_some());
    }
}
