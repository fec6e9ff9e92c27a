//! Core systems for Horizon Weave.
//!
//! This crate provides the declarative object-graph builder at the heart of
//! Horizon Weave:
//!
//! - **Configuration**: read-only JSON-model trees addressed by key path
//! - **Type Registry**: short type names, class names and constructors
//! - **Object Builder**: instantiation and generic property configuration
//! - **Dependency Tracker**: build-once named objects with cycle-safe
//!   deferred references
//! - **Lifecycle**: post-build hooks and service start/stop
//! - **Message Router**: path-addressed delivery between named objects
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_weave_core::{
//!     object_arc_cast, ClassEntry, Container, FromPropertyValue, Object, ObjectRef, Property,
//!     PropertyError, PropertyResult, PropertyValue,
//! };
//!
//! #[derive(Default)]
//! struct Logger;
//! impl Object for Logger {}
//!
//! #[derive(Default)]
//! struct Worker {
//!     log: Property<Option<ObjectRef>>,
//! }
//!
//! impl Object for Worker {
//!     fn set_property(&self, name: &str, value: PropertyValue) -> PropertyResult<()> {
//!         match name {
//!             "log" => Ok(self.log.set_silent(FromPropertyValue::from_property_value(value)?)),
//!             _ => Err(PropertyError::NotFound(name.to_owned())),
//!         }
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_type("logger", ClassEntry::of_default::<Logger>());
//! container.register_type("worker", ClassEntry::of_default::<Worker>());
//! container.configure_with_data(serde_json::json!({
//!     "svc1": {"*type": "logger"},
//!     "svc2": {"*type": "worker", "log": "named:svc1"}
//! }));
//!
//! let worker = object_arc_cast::<Worker>(container.get_named("svc2").unwrap()).unwrap();
//! let log = worker.log.get().unwrap();
//! assert!(Arc::ptr_eq(&log, &container.get_named("svc1").unwrap()));
//! ```

mod builder;
pub mod config;
mod configurer;
mod container;
mod context;
mod error;
mod lifecycle;
pub mod logging;
pub mod message;
pub mod object;
pub mod pending;
pub mod property;
pub mod reference;
mod router;
pub mod signal;
pub mod types;
pub mod value;

pub use builder::{Configurable, ObjectFactory};
pub use config::Configuration;
pub use configurer::Configurer;
pub use container::{BuildState, Container};
pub use context::Context;
pub use error::{
    BuildError, ConfigError, ConfigResult, PendingError, PropertyError, PropertyResult, Result,
    ServiceError, ServiceResult, WeaveError,
};
pub use lifecycle::{ContainerAware, ContextAware, Service};
pub use logging::{ObjectTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use message::{Message, MessageParseError, TargetPath};
pub use object::{object_arc_cast, object_cast, same_object, Object, ObjectId, ObjectRef, ObjectRegistry};
pub use pending::{Resolved, Slot};
pub use property::Property;
pub use reference::Reference;
pub use router::{MessageHandler, MessageReceiver, MessageRouter};
pub use signal::{ConnectionId, Signal};
pub use types::{ClassEntry, TypeRegistry};
pub use value::{downcast_object, FromPropertyValue, PropertyValue};
