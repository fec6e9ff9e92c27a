//! Object lifecycle: post-build hooks and service start/stop.
//!
//! Every object a container constructs passes through two hooks:
//!
//! - **post-instantiation**, right after construction: platform context and
//!   container back-references are injected, a nested container gets this
//!   container as its parent, and the object is registered (and tracked as a
//!   service when it is one)
//! - **post-configuration**, once every property is assigned: the
//!   container-aware `after_configure` callback runs, and a service built
//!   while the container is running is started
//!
//! Post-configuration of an object that holds unfilled pending references
//! waits until the last of them is filled.

use std::sync::Weak;
use std::sync::atomic::Ordering;

use crate::container::Container;
use crate::context::Context;
use crate::error::ServiceResult;
use crate::object::{ObjectId, ObjectRef};

/// A long-running object started and stopped with its container.
pub trait Service: Send + Sync {
    /// Start the service.
    fn start_service(&self) -> ServiceResult;

    /// Stop the service.
    fn stop_service(&self) -> ServiceResult;
}

/// An object that wants the platform context.
pub trait ContextAware: Send + Sync {
    /// Called once, right after instantiation.
    fn set_context(&self, context: &Context);
}

/// An object that wants a handle to the container that built it.
pub trait ContainerAware: Send + Sync {
    /// Called once, right after instantiation.
    fn set_container(&self, container: Weak<Container>);

    /// Called before the object's properties are configured.
    fn before_configure(&self, container: &Container) {
        let _ = container;
    }

    /// Called after the object's properties are configured, including any
    /// that waited on a cyclic reference.
    fn after_configure(&self, container: &Container) {
        let _ = container;
    }
}

/// Services in registration order.
#[derive(Default)]
pub(crate) struct ServiceList {
    services: Vec<(ObjectId, ObjectRef)>,
}

impl ServiceList {
    pub(crate) fn push(&mut self, id: ObjectId, object: ObjectRef) {
        if !self.services.iter().any(|(existing, _)| *existing == id) {
            self.services.push((id, object));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<(ObjectId, ObjectRef)> {
        self.services.clone()
    }
}

impl Container {
    /// Inject back-references and register a freshly constructed object.
    ///
    /// Objects already in the arena keep their id and are not hooked again.
    pub(crate) fn post_instantiation(&self, object: &ObjectRef, owner: Option<ObjectId>) -> ObjectId {
        let known = self.graph.lock().id_of(object);
        if let Some(id) = known {
            return id;
        }

        if let Some(aware) = object.as_context_aware() {
            aware.set_context(&self.context);
        }
        if let Some(aware) = object.as_container_aware() {
            aware.set_container(self.self_ref.clone());
        }
        if let Some(nested) = object.as_container() {
            nested.set_parent(self);
        }

        let id = self.graph.lock().register(object.clone(), owner);
        if object.as_service().is_some() {
            self.services.lock().push(id, object.clone());
            tracing::trace!(target: "horizon_weave_core::lifecycle", ?id, "tracking service");
        }
        id
    }

    /// Run the after-configuration hooks for a fully configured object.
    pub(crate) fn post_configuration(&self, object: &ObjectRef, identifier: &str) {
        if let Some(aware) = object.as_container_aware() {
            aware.after_configure(self);
        }
        if self.is_running()
            && let Some(service) = object.as_service()
        {
            tracing::debug!(target: "horizon_weave_core::lifecycle", identifier, "starting service built while running");
            if let Err(err) = service.start_service() {
                tracing::error!(target: "horizon_weave_core::lifecycle", identifier, error = %err, "service failed to start");
            }
        }
    }

    /// Start every tracked service, in registration order.
    ///
    /// A failing service is logged and the remaining services still start.
    #[tracing::instrument(skip(self), target = "horizon_weave_core::lifecycle", level = "debug")]
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        let services = self.services.lock().snapshot();
        tracing::debug!(target: "horizon_weave_core::lifecycle", count = services.len(), "starting services");
        for (id, object) in services {
            if let Some(service) = object.as_service()
                && let Err(err) = service.start_service()
            {
                let name = self.name_of(id);
                tracing::error!(
                    target: "horizon_weave_core::lifecycle",
                    service = name.as_deref().unwrap_or(object.type_name()),
                    error = %err,
                    "service failed to start"
                );
            }
        }
        self.running_changed.emit(true);
    }

    /// Stop every tracked service, in registration order, then clear the
    /// running state.
    #[tracing::instrument(skip(self), target = "horizon_weave_core::lifecycle", level = "debug")]
    pub fn stop(&self) {
        let services = self.services.lock().snapshot();
        tracing::debug!(target: "horizon_weave_core::lifecycle", count = services.len(), "stopping services");
        for (id, object) in services {
            if let Some(service) = object.as_service()
                && let Err(err) = service.stop_service()
            {
                let name = self.name_of(id);
                tracing::error!(
                    target: "horizon_weave_core::lifecycle",
                    service = name.as_deref().unwrap_or(object.type_name()),
                    error = %err,
                    "service failed to stop"
                );
            }
        }
        self.running.store(false, Ordering::SeqCst);
        self.running_changed.emit(false);
    }

    /// Whether [`start`](Container::start) ran more recently than
    /// [`stop`](Container::stop).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of tracked services.
    pub fn service_count(&self) -> usize {
        self.services.lock().len()
    }
}

impl Service for Container {
    fn start_service(&self) -> ServiceResult {
        self.start();
        Ok(())
    }

    fn stop_service(&self) -> ServiceResult {
        self.stop();
        Ok(())
    }
}
