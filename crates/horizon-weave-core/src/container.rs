//! The container: builds a configuration's named objects and owns them.
//!
//! [`Container::configure_with`] takes a mapping of names to definitions and
//! builds every name exactly once: priority names first, in declared order,
//! then the rest in document order. Names may reference each other with
//! `named:<name>`. A reference to a name that isn't built yet triggers its
//! build; a reference to a name that is still building (a cycle) is handed
//! a pending slot, filled when that build completes.
//!
//! # Example
//!
//! ```
//! use horizon_weave_core::{ClassEntry, Configuration, Container, Object};
//!
//! #[derive(Default)]
//! struct Logger;
//! impl Object for Logger {}
//!
//! let container = Container::new();
//! container.register_type("logger", ClassEntry::of_default::<Logger>());
//! container.configure_with(Configuration::from_json_str(r#"{"log": {"*type": "logger"}}"#).unwrap());
//!
//! let first = container.get_named("log").unwrap();
//! let second = container.get_named("log").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```
//!
//! Nested containers are declared with `*type: "container"` and accept
//! `types`, `priority` and `named` keys. They inherit the parent's type
//! registry and fall back to the parent's built names.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::builder::Configurable;
use crate::config::{self, Configuration};
use crate::configurer::Configurer;
use crate::context::Context;
use crate::lifecycle::{ServiceList, Service};
use crate::logging::{ObjectTreeDebug, PerfSpan};
use crate::object::{Object, ObjectId, ObjectRef, ObjectRegistry};
use crate::pending::{DependencyTracker, Slot};
use crate::reference::Reference;
use crate::router::{MessageHandler, MessageReceiver, MessageRouter};
use crate::signal::Signal;
use crate::types::{ClassEntry, TypeRegistry};
use crate::value::{FromPropertyValue, PropertyValue};

/// Build progress of a configured name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Not built yet.
    Unbuilt,
    /// Build in progress.
    Building,
    /// Built; lookups return the cached instance.
    Built,
    /// Build produced nothing; the name is never rebuilt.
    Failed,
}

/// Outcome of a named lookup made while configuring an object.
pub(crate) enum Lookup {
    Ready(ObjectRef),
    Deferred(Slot),
    Missing,
}

// Outcome of starting a named build.
enum NamedBuild {
    Done(Option<ObjectRef>),
    // An alias whose target is still building; completes with the target.
    Waiting,
}

/// Builds, owns and starts the objects of a configuration.
///
/// Created inside an `Arc` so objects can hold `Weak` back-references.
///
/// The container holds the only required strong handle to each object it
/// built, so dropping it drops the graph. Objects that reference each other
/// through strong [`ObjectRef`] properties form an `Arc` cycle and outlive
/// the container; a property on one side of such a cycle should keep a
/// `Weak<dyn Object>` instead.
pub struct Container {
    pub(crate) self_ref: Weak<Container>,
    pub(crate) context: Context,
    parent: RwLock<Weak<Container>>,
    pub(crate) types: RwLock<TypeRegistry>,
    priority_names: RwLock<Vec<String>>,
    configuration: RwLock<Configuration>,
    pub(crate) graph: Mutex<ObjectRegistry>,
    pub(crate) tracker: Mutex<DependencyTracker>,
    pub(crate) services: Mutex<ServiceList>,
    pub(crate) running: AtomicBool,
    pub(crate) message_handler: RwLock<Option<MessageHandler>>,
    build_started: Signal<String>,
    object_built: Signal<String>,
    pub(crate) running_changed: Signal<bool>,
}

static_assertions::assert_impl_all!(Container: Send, Sync);

impl Container {
    /// A root container with an empty platform context.
    pub fn new() -> Arc<Self> {
        Self::with_context(Context::new())
    }

    /// A root container whose context-aware objects receive `context`.
    pub fn with_context(context: Context) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            context,
            parent: RwLock::new(Weak::new()),
            types: RwLock::new(TypeRegistry::new()),
            priority_names: RwLock::new(Vec::new()),
            configuration: RwLock::new(Configuration::empty()),
            graph: Mutex::new(ObjectRegistry::new()),
            tracker: Mutex::new(DependencyTracker::new()),
            services: Mutex::new(ServiceList::default()),
            running: AtomicBool::new(false),
            message_handler: RwLock::new(None),
            build_started: Signal::new(),
            object_built: Signal::new(),
            running_changed: Signal::new(),
        })
    }

    /// The platform context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// A strong handle to this container.
    pub fn handle(&self) -> Option<Arc<Container>> {
        self.self_ref.upgrade()
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Replace the type mappings.
    pub fn set_types(&self, types: &Configuration) {
        self.types.write().set_types(types);
    }

    /// Merge further type mappings over the current ones.
    pub fn add_types(&self, types: &Configuration) {
        self.types.write().add_types(types);
    }

    /// Register constructors under a class name.
    pub fn register_class(&self, class_name: &str, entry: ClassEntry) {
        self.types.write().register_class(class_name, entry);
    }

    /// Register constructors under a type name (also used as class name).
    pub fn register_type(&self, type_name: &str, entry: ClassEntry) {
        self.types.write().register(type_name, entry);
    }

    /// Read access to the type registry.
    pub fn with_types<R>(&self, f: impl FnOnce(&TypeRegistry) -> R) -> R {
        f(&self.types.read())
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Names to build before any other, in order.
    pub fn set_priority_names<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.priority_names.write() = names.into_iter().map(Into::into).collect();
    }

    /// The priority names.
    pub fn priority_names(&self) -> Vec<String> {
        self.priority_names.read().clone()
    }

    /// Build every named object in `configuration`.
    ///
    /// Priority names go first, then the remaining names in document order.
    /// Names already built (or failed) are skipped, so calling this again
    /// with a larger configuration builds only the new names.
    #[tracing::instrument(skip_all, target = "horizon_weave_core::container", level = "debug")]
    pub fn configure_with(&self, configuration: Configuration) {
        let _perf = PerfSpan::new("configure_with");
        *self.configuration.write() = configuration.clone();

        for name in self.priority_names() {
            if self.build_state(&name) == BuildState::Unbuilt {
                let _ = self.get_named(&name);
            }
        }
        for name in configuration.value_names() {
            if self.build_state(&name) == BuildState::Unbuilt {
                let _ = self.build_named_object(&name);
            }
        }
        tracing::debug!(
            target: "horizon_weave_core::container",
            objects = self.graph.lock().object_count(),
            "configuration built"
        );
    }

    /// Build every named object in a raw data tree.
    pub fn configure_with_data(&self, data: Value) {
        self.configure_with(Configuration::new(data));
    }

    /// Parse a JSON document and build its named objects.
    ///
    /// Only a malformed document is an error; objects that fail to build are
    /// logged and left absent, as with [`configure_with`](Self::configure_with).
    pub fn configure_with_json(&self, text: &str) -> crate::Result<()> {
        let configuration = Configuration::from_json_str(text)?;
        self.configure_with(configuration);
        Ok(())
    }

    /// The configuration passed to the last `configure_with`.
    pub fn configuration(&self) -> Configuration {
        self.configuration.read().clone()
    }

    /// The named object, building it on first request.
    ///
    /// Returns `None` for names that are unknown here and in every ancestor,
    /// whose build failed, or that are still building (a cycle reached
    /// without a consumer to hand a pending slot to).
    pub fn get_named(&self, name: &str) -> Option<ObjectRef> {
        match self.lookup_named(name, None) {
            Lookup::Ready(object) => Some(object),
            Lookup::Deferred(_) | Lookup::Missing => None,
        }
    }

    /// The named object converted to `T`.
    pub fn get_named_as<T: FromPropertyValue>(&self, name: &str) -> Option<T> {
        let object = self.get_named(name)?;
        T::from_property_value(PropertyValue::Object(object)).ok()
    }

    /// The named object if it is already built, here or in an ancestor.
    /// Never triggers a build.
    pub fn lookup_built(&self, name: &str) -> Option<ObjectRef> {
        let local = self.graph.lock().named(name);
        local.or_else(|| self.parent().and_then(|parent| parent.lookup_built(name)))
    }

    /// Build progress of a name in this container.
    pub fn build_state(&self, name: &str) -> BuildState {
        {
            let graph = self.graph.lock();
            if graph.is_failed(name) {
                return BuildState::Failed;
            }
            if graph.is_resolved(name) {
                return BuildState::Built;
            }
        }
        if self.tracker.lock().is_building(name) {
            BuildState::Building
        } else {
            BuildState::Unbuilt
        }
    }

    pub(crate) fn lookup_named(&self, name: &str, consumer: Option<ObjectId>) -> Lookup {
        {
            let graph = self.graph.lock();
            if let Some(object) = graph.named(name) {
                return Lookup::Ready(object);
            }
            if graph.is_failed(name) {
                return Lookup::Missing;
            }
        }

        if self.tracker.lock().is_building(name) {
            return self.defer_named(name, consumer);
        }

        if self.has_definition(name) {
            return match self.build_named_object(name) {
                NamedBuild::Done(result) => result.map_or(Lookup::Missing, Lookup::Ready),
                NamedBuild::Waiting => self.defer_named(name, consumer),
            };
        }

        match self.parent().and_then(|parent| parent.lookup_built(name)) {
            Some(object) => Lookup::Ready(object),
            None => {
                tracing::debug!(target: "horizon_weave_core::container", name, "unknown name");
                Lookup::Missing
            }
        }
    }

    // A slot for the building `name`, or nothing when there is no consumer
    // to hand it to.
    fn defer_named(&self, name: &str, consumer: Option<ObjectId>) -> Lookup {
        let mut tracker = self.tracker.lock();
        match consumer.and_then(|consumer| tracker.defer(name, consumer)) {
            Some(slot) => Lookup::Deferred(slot),
            None => {
                tracing::debug!(
                    target: "horizon_weave_core::pending",
                    name,
                    building = ?tracker.building_names(),
                    "named dependency cycle detected"
                );
                Lookup::Missing
            }
        }
    }

    fn has_definition(&self, name: &str) -> bool {
        self.configuration
            .read()
            .root()
            .as_object()
            .is_some_and(|map| map.contains_key(name))
    }

    fn definition(&self, name: &str) -> Option<Value> {
        self.configuration.read().root().as_object()?.get(name).cloned()
    }

    #[tracing::instrument(skip(self), target = "horizon_weave_core::container", level = "debug")]
    fn build_named_object(&self, name: &str) -> NamedBuild {
        let Some(definition) = self.definition(name) else {
            return NamedBuild::Done(None);
        };
        if !self.tracker.lock().begin(name) {
            return NamedBuild::Done(None);
        }
        self.build_started.emit(name.to_owned());

        let result = if config::is_object_definition(&definition) {
            self.build_owned(&Configuration::new(definition), name, None)
        } else {
            match self.resolve_alias(name, &definition) {
                NamedBuild::Done(result) => result,
                NamedBuild::Waiting => return NamedBuild::Waiting,
            }
        };
        self.complete_named(name, result.clone());
        NamedBuild::Done(result)
    }

    // Bind the outcome of a named build, fill the slots handed out for it and
    // complete the aliases waiting on it.
    fn complete_named(&self, name: &str, result: Option<ObjectRef>) {
        {
            let mut graph = self.graph.lock();
            match &result {
                Some(object) => {
                    let id = graph.register(object.clone(), None);
                    graph.bind_name(name, id);
                }
                None => graph.mark_failed(name),
            }
        }

        let (pending, aliases) = {
            let mut tracker = self.tracker.lock();
            (tracker.finish(name), tracker.take_aliases(name))
        };
        if !pending.is_empty() {
            tracing::debug!(
                target: "horizon_weave_core::pending",
                name,
                count = pending.len(),
                "filling pending references"
            );
        }
        for pending_ref in pending {
            pending_ref.complete(result.clone());
            let released = self.tracker.lock().release(pending_ref.consumer);
            if let Some(deferred) = released {
                self.post_configuration(&deferred.object, &deferred.identifier);
            }
        }

        self.object_built.emit(name.to_owned());
        for alias in aliases {
            self.complete_named(&alias, result.clone());
        }
    }

    // A top-level entry that isn't an object definition: a reference aliases
    // the object it resolves to, anything else is plain data. An alias to a
    // name that is still building waits for that build.
    fn resolve_alias(&self, name: &str, definition: &Value) -> NamedBuild {
        let reference = definition.as_str().and_then(Reference::parse);
        match &reference {
            Some(Reference::Named(target)) if *target == name => {
                tracing::debug!(target: "horizon_weave_core::container", name, "alias refers to itself");
                return NamedBuild::Done(None);
            }
            Some(Reference::Named(target)) => {
                let mut tracker = self.tracker.lock();
                if tracker.is_building(target) {
                    tracker.defer_alias(target, name);
                    return NamedBuild::Waiting;
                }
            }
            Some(Reference::Make(_)) => {}
            _ => {
                tracing::debug!(target: "horizon_weave_core::container", name, "top-level value is not an object definition");
                return NamedBuild::Done(None);
            }
        }
        match self.resolve_value(definition, name, None, None).into_ready() {
            Some(PropertyValue::Object(object)) => NamedBuild::Done(Some(object)),
            _ => NamedBuild::Done(None),
        }
    }

    // -------------------------------------------------------------------------
    // Nesting
    // -------------------------------------------------------------------------

    /// The parent container, if any.
    pub fn parent(&self) -> Option<Arc<Container>> {
        self.parent.read().upgrade()
    }

    /// Nest this container beneath `parent`: unresolved names fall back to
    /// the parent's built names and the parent's types sit beneath this
    /// container's own.
    pub fn set_parent(&self, parent: &Container) {
        *self.parent.write() = parent.self_ref.clone();
        let parent_types = parent.types.read().clone();
        self.types.write().inherit(&parent_types);
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Read access to the object arena.
    pub fn with_graph<R>(&self, f: impl FnOnce(&ObjectRegistry) -> R) -> R {
        f(&self.graph.lock())
    }

    /// Names bound so far, in build-completion order.
    pub fn names(&self) -> Vec<String> {
        self.graph.lock().names().map(str::to_owned).collect()
    }

    /// The first name an object was bound under.
    pub fn name_of(&self, id: ObjectId) -> Option<String> {
        self.graph.lock().name_of(id).map(str::to_owned)
    }

    /// Render the object arena as a tree.
    pub fn debug_tree(&self) -> String {
        self.with_graph(|graph| ObjectTreeDebug::new().format_all(graph))
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    /// Emitted with the name when a named build starts.
    pub fn build_started(&self) -> &Signal<String> {
        &self.build_started
    }

    /// Emitted with the name when a named build completes, successfully or
    /// not, after its pending references are filled.
    pub fn object_built(&self) -> &Signal<String> {
        &self.object_built
    }

    /// Emitted when the container starts or stops.
    pub fn running_changed(&self) -> &Signal<bool> {
        &self.running_changed
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("names", &self.names())
            .field("services", &self.service_count())
            .field("running", &self.is_running())
            .field("nested", &self.parent().is_some())
            .finish()
    }
}

impl Object for Container {
    fn type_name(&self) -> &'static str {
        "horizon_weave_core::Container"
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }

    fn as_receiver(&self) -> Option<&dyn MessageReceiver> {
        Some(self)
    }

    fn as_router(&self) -> Option<&dyn MessageRouter> {
        Some(self)
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_container(&self) -> Option<&Container> {
        Some(self)
    }
}

/// Nested container definitions: `types`, `priority` and `named`.
impl Configurable for Container {
    fn configure(&self, configuration: &Configuration, configurer: &Configurer<'_>) {
        if let Some(types) = configuration.get_configuration("types") {
            self.add_types(&types);
        }
        if let Some(priority) = configuration.get_value("priority") {
            match priority.as_array() {
                Some(names) => self.set_priority_names(names.iter().filter_map(Value::as_str)),
                None => tracing::warn!(
                    target: "horizon_weave_core::container",
                    identifier = configurer.identifier(),
                    "priority must be a list of names"
                ),
            }
        }
        if let Some(named) = configuration.get_configuration("named") {
            self.configure_with(named);
        }
    }
}
