//! Object builder: turns an object definition into a configured object.
//!
//! An object definition is a configuration mapping carrying one of the
//! reserved keys:
//!
//! - `*factory`: a reference to (or definition of) an [`ObjectFactory`]
//!   that builds the object
//! - `*and-class`: the class to instantiate
//! - `*type`: a short type name mapped to a class by the type registry
//!
//! Building one object runs: instantiate, post-instantiation, configure,
//! post-configuration. Build errors are logged and the single object is
//! absent; the surrounding build carries on.

use serde_json::{Map, Value};

use crate::config::{Configuration, CLASS_KEY, FACTORY_KEY, TYPE_KEY};
use crate::configurer::Configurer;
use crate::container::Container;
use crate::error::BuildError;
use crate::object::{ObjectId, ObjectRef};
use crate::pending::DeferredConfiguration;
use crate::value::PropertyValue;

/// An object that configures itself instead of taking the generic
/// property-by-property configuration.
pub trait Configurable: Send + Sync {
    /// Configure from the object's definition.
    ///
    /// `configurer` resolves values the same way the generic path does,
    /// including named references that are still building.
    fn configure(&self, configuration: &Configuration, configurer: &Configurer<'_>);
}

/// An object that builds other objects.
pub trait ObjectFactory: Send + Sync {
    /// Build the object described by `configuration`. `None` when it can't.
    fn build_object(
        &self,
        configuration: &Configuration,
        container: &Container,
        identifier: &str,
    ) -> Option<ObjectRef>;
}

impl Container {
    /// Build and configure the object described by `configuration`.
    ///
    /// `identifier` is the key path of the definition, used in logs.
    pub fn build_object(&self, configuration: &Configuration, identifier: &str) -> Option<ObjectRef> {
        self.build_owned(configuration, identifier, None)
    }

    /// Instantiate the object described by `configuration` and run its
    /// post-instantiation hooks, without configuring it.
    pub fn instantiate_object(&self, configuration: &Configuration, identifier: &str) -> Option<ObjectRef> {
        match self.try_instantiate(configuration, identifier) {
            Ok(object) => {
                self.post_instantiation(&object, None);
                Some(object)
            }
            Err(err) => {
                tracing::error!(target: "horizon_weave_core::builder", "{err}");
                None
            }
        }
    }

    /// Configure an object created elsewhere, e.g. by an object factory.
    ///
    /// Unknown objects are registered (with post-instantiation hooks) first.
    pub fn configure_object(&self, object: &ObjectRef, configuration: &Configuration, identifier: &str) {
        let id = self.post_instantiation(object, None);
        self.configure_instance(object, id, configuration, identifier);
    }

    /// Instantiate a registered type with `configuration` available to its
    /// constructor. The object is registered but not configured.
    pub fn new_instance_for_type(&self, type_name: &str, configuration: &Configuration) -> Option<ObjectRef> {
        let mut definition = Map::new();
        definition.insert(TYPE_KEY.to_owned(), Value::String(type_name.to_owned()));
        self.instantiate_object(&configuration.mixin(&Configuration::new(Value::Object(definition))), type_name)
    }

    #[tracing::instrument(skip(self, configuration), target = "horizon_weave_core::builder", level = "trace")]
    pub(crate) fn build_owned(
        &self,
        configuration: &Configuration,
        identifier: &str,
        owner: Option<ObjectId>,
    ) -> Option<ObjectRef> {
        if configuration.has_value(FACTORY_KEY) {
            return self.build_with_factory(configuration, identifier, owner);
        }

        let object = match self.try_instantiate(configuration, identifier) {
            Ok(object) => object,
            Err(err) => {
                tracing::error!(target: "horizon_weave_core::builder", "{err}");
                return None;
            }
        };
        let id = self.post_instantiation(&object, owner);
        self.configure_instance(&object, id, configuration, identifier);
        Some(object)
    }

    fn build_with_factory(
        &self,
        configuration: &Configuration,
        identifier: &str,
        owner: Option<ObjectId>,
    ) -> Option<ObjectRef> {
        let factory_identifier = format!("{identifier}.{FACTORY_KEY}");
        let factory = configuration
            .get_value(FACTORY_KEY)
            .map(|raw| self.resolve_value(raw, &factory_identifier, None, owner))
            .and_then(|resolved| resolved.into_ready());

        let Some(PropertyValue::Object(factory)) = factory else {
            let err = BuildError::InvalidFactory {
                identifier: identifier.to_owned(),
            };
            tracing::error!(target: "horizon_weave_core::builder", "{err}");
            return None;
        };
        let Some(object_factory) = factory.as_factory() else {
            let err = BuildError::InvalidFactory {
                identifier: identifier.to_owned(),
            };
            tracing::error!(target: "horizon_weave_core::builder", factory = factory.type_name(), "{err}");
            return None;
        };

        let object = object_factory.build_object(configuration, self, identifier)?;
        // A factory that built through this container already ran the hooks.
        let known = self.graph.lock().id_of(&object).is_some();
        if !known {
            self.post_instantiation(&object, owner);
            self.post_configuration(&object, identifier);
        }
        Some(object)
    }

    pub(crate) fn try_instantiate(&self, configuration: &Configuration, identifier: &str) -> Result<ObjectRef, BuildError> {
        let (class_name, entry) = {
            let types = self.types.read();
            let class_name = match configuration.get_str(CLASS_KEY) {
                Some(class_name) => class_name.to_owned(),
                None => {
                    let type_name = configuration.get_str(TYPE_KEY).ok_or_else(|| BuildError::MissingType {
                        identifier: identifier.to_owned(),
                    })?;
                    types
                        .class_for_type(type_name)
                        .ok_or_else(|| BuildError::UnknownType {
                            identifier: identifier.to_owned(),
                            type_name: type_name.to_owned(),
                        })?
                        .to_owned()
                }
            };
            let entry = types.class(&class_name).cloned().ok_or_else(|| BuildError::UnknownClass {
                identifier: identifier.to_owned(),
                class_name: class_name.clone(),
            })?;
            (class_name, entry)
        };

        tracing::trace!(target: "horizon_weave_core::builder", identifier, class_name, "instantiating");
        entry
            .instantiate(&self.context, configuration)
            .ok_or_else(|| BuildError::NoConstructor {
                identifier: identifier.to_owned(),
                class_name,
            })
    }

    /// Configure an instantiated object and run, or defer, its
    /// post-configuration.
    pub(crate) fn configure_instance(
        &self,
        object: &ObjectRef,
        id: ObjectId,
        configuration: &Configuration,
        identifier: &str,
    ) {
        if let Some(aware) = object.as_container_aware() {
            aware.before_configure(self);
        }

        let configurer = Configurer::new(self, object.clone(), id, identifier);
        match object.as_configurable() {
            Some(configurable) => configurable.configure(configuration, &configurer),
            None => configurer.configure_with(configuration),
        }

        let deferred = {
            let mut tracker = self.tracker.lock();
            if tracker.has_pending_refs(id) {
                tracker.defer_configuration(
                    id,
                    DeferredConfiguration {
                        object: object.clone(),
                        identifier: identifier.to_owned(),
                    },
                );
                true
            } else {
                false
            }
        };

        if deferred {
            tracing::debug!(target: "horizon_weave_core::builder", identifier, "post-configuration deferred until pending references fill");
        } else {
            self.post_configuration(object, identifier);
        }
    }
}
