//! Generic property configuration.
//!
//! The [`Configurer`] walks an object definition and assigns each
//! non-reserved key to the property of the same name. Values are resolved
//! first:
//!
//! - `named:` references become the named object, or a pending slot when the
//!   name is still building
//! - `make:` references and nested object definitions are built, owned by
//!   the object being configured
//! - `post:` references become [`Message`]s
//! - sequences and mappings are resolved element by element
//!
//! Assignments whose value waits on a slot run when the slot is filled.

use serde_json::{Map, Value};

use crate::config::{self, Configuration, TYPE_KEY};
use crate::container::{Container, Lookup};
use crate::message::Message;
use crate::object::{ObjectId, ObjectRef};
use crate::pending::{PendingAssignment, Resolved};
use crate::reference::Reference;
use crate::value::PropertyValue;

/// Resolves and assigns the properties of one object being built.
pub struct Configurer<'a> {
    container: &'a Container,
    object: ObjectRef,
    id: ObjectId,
    identifier: String,
}

impl<'a> Configurer<'a> {
    pub(crate) fn new(container: &'a Container, object: ObjectRef, id: ObjectId, identifier: &str) -> Self {
        Self {
            container,
            object,
            id,
            identifier: identifier.to_owned(),
        }
    }

    /// The container building the object.
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// The object being configured.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The arena id of the object being configured.
    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    /// Key path of the object's definition.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Assign every non-reserved key of `configuration`, in document order.
    pub fn configure_with(&self, configuration: &Configuration) {
        let Some(entries) = configuration.root().as_object() else {
            return;
        };
        for (key, raw) in entries {
            if config::is_reserved_key(key) {
                continue;
            }
            self.assign(key, self.resolve_raw(raw, key));
        }
    }

    /// Resolve the value of the top-level `key` and assign it to `property`.
    pub fn configure_property(&self, configuration: &Configuration, key: &str, property: &str) {
        if let Some(resolved) = self.resolve(configuration, key) {
            self.assign(property, resolved);
        }
    }

    /// Resolve the value of the top-level `key`, taken literally. Pending
    /// slots in the result count against this object until they fill.
    pub fn resolve(&self, configuration: &Configuration, key: &str) -> Option<Resolved> {
        let raw = configuration.get_entry(key)?;
        Some(self.resolve_raw(raw, key))
    }

    /// Resolve the value at a key path such as `layout.items[0]`.
    pub fn resolve_path(&self, configuration: &Configuration, path: &str) -> Option<Resolved> {
        let raw = configuration.get_value(path)?;
        Some(self.resolve_raw(raw, path))
    }

    fn resolve_raw(&self, raw: &Value, key: &str) -> Resolved {
        let identifier = format!("{}.{key}", self.identifier);
        self.container
            .resolve_value(raw, &identifier, Some(self.id), Some(self.id))
    }

    /// Resolve the value at `key`, if it doesn't wait on a building name.
    pub fn resolve_ready(&self, configuration: &Configuration, key: &str) -> Option<PropertyValue> {
        self.resolve(configuration, key)?.into_ready()
    }

    /// Assign a resolved value through the object's `set_property`, now or
    /// once its slots fill. `Null` is never assigned.
    pub fn assign(&self, property: &str, resolved: Resolved) {
        let object = self.object.clone();
        let property = property.to_owned();
        let identifier = self.identifier.clone();
        let description = format!("{identifier}.{property}");
        PendingAssignment::attach(description, resolved, move |value| {
            assign_property(&object, &property, value, &identifier);
        });
    }

    /// Run `action` with the finished value, now or once its slots fill.
    pub fn when_ready<F>(&self, resolved: Resolved, action: F)
    where
        F: FnOnce(PropertyValue) + Send + 'static,
    {
        PendingAssignment::attach(self.identifier.clone(), resolved, action);
    }
}

fn assign_property(object: &ObjectRef, property: &str, value: PropertyValue, identifier: &str) {
    if value.is_null() {
        tracing::trace!(target: "horizon_weave_core::builder", identifier, property, "skipping null value");
        return;
    }
    if let Err(err) = object.set_property(property, value) {
        tracing::warn!(
            target: "horizon_weave_core::builder",
            identifier,
            property,
            error = %err,
            "property assignment failed"
        );
    }
}

impl Container {
    /// Resolve a raw configuration value.
    ///
    /// `consumer` is the object that will hold the value; without one, a
    /// reference to a building name resolves to nothing. `owner` becomes the
    /// owner of any object built along the way.
    pub(crate) fn resolve_value(
        &self,
        raw: &Value,
        identifier: &str,
        consumer: Option<ObjectId>,
        owner: Option<ObjectId>,
    ) -> Resolved {
        match raw {
            Value::String(text) => match Reference::parse(text) {
                Some(reference) => self.resolve_reference(reference, identifier, consumer, owner),
                None => Resolved::Ready(PropertyValue::String(text.clone())),
            },
            Value::Array(items) => Resolved::list(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.resolve_value(item, &format!("{identifier}.{index}"), consumer, owner)
                    })
                    .collect(),
            ),
            Value::Object(_) if config::is_object_definition(raw) => {
                let built = self.build_owned(&Configuration::new(raw.clone()), identifier, owner);
                Resolved::Ready(built.map_or(PropertyValue::Null, PropertyValue::Object))
            }
            Value::Object(map) => Resolved::map(
                map.iter()
                    .map(|(key, value)| {
                        let resolved = self.resolve_value(value, &format!("{identifier}.{key}"), consumer, owner);
                        (key.clone(), resolved)
                    })
                    .collect(),
            ),
            scalar => Resolved::Ready(PropertyValue::from_json(scalar)),
        }
    }

    fn resolve_reference(
        &self,
        reference: Reference<'_>,
        identifier: &str,
        consumer: Option<ObjectId>,
        owner: Option<ObjectId>,
    ) -> Resolved {
        match reference {
            Reference::Named(name) => match self.lookup_named(name, consumer) {
                Lookup::Ready(object) => Resolved::Ready(PropertyValue::Object(object)),
                Lookup::Deferred(slot) => Resolved::Deferred(slot),
                Lookup::Missing => {
                    tracing::debug!(target: "horizon_weave_core::builder", identifier, name, "named reference unresolved");
                    Resolved::Ready(PropertyValue::Null)
                }
            },
            Reference::Make(type_name) => {
                let mut definition = Map::new();
                definition.insert(TYPE_KEY.to_owned(), Value::String(type_name.to_owned()));
                let definition = Configuration::new(Value::Object(definition));
                let built = self.build_owned(&definition, identifier, owner);
                Resolved::Ready(built.map_or(PropertyValue::Null, PropertyValue::Object))
            }
            Reference::Post(text) => match Message::parse(text) {
                Ok(message) => Resolved::Ready(PropertyValue::Message(self.resolve_message(message, owner))),
                Err(err) => {
                    tracing::warn!(target: "horizon_weave_core::builder", identifier, error = %err, "invalid post: reference");
                    Resolved::Ready(PropertyValue::Null)
                }
            },
        }
    }

    /// Resolve reference strings among a message's parameters.
    pub(crate) fn resolve_message(&self, mut message: Message, owner: Option<ObjectId>) -> Message {
        let identifier = format!("post:{}", message.name());
        for (key, value) in message.parameters_mut() {
            let PropertyValue::String(text) = value else {
                continue;
            };
            if Reference::parse(text).is_none() {
                continue;
            }
            let raw = Value::String(std::mem::take(text));
            *value = self
                .resolve_value(&raw, &format!("{identifier}.{key}"), None, owner)
                .into_ready()
                .unwrap_or_default();
        }
        message
    }
}
