//! Integration tests for service start/stop.

use std::sync::Arc;

use horizon_weave_core::{
    object_arc_cast, Container, Context, ContextAware, ObjectRef, Property, Service, ServiceError, ServiceResult,
};
use horizon_weave_macros::Object;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl Events {
    fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

#[derive(Object, Default)]
#[object(service, context_aware)]
struct Daemon {
    #[property]
    label: Property<String>,

    #[property]
    fail: Property<bool>,

    #[property(name = "fail-stop")]
    fail_stop: Property<bool>,

    #[property]
    next: Property<Option<ObjectRef>>,

    running: Property<bool>,
    events: Mutex<Option<Arc<Events>>>,
}

impl Daemon {
    fn emit(&self, event: &str) {
        if let Some(events) = self.events.lock().as_ref() {
            events.push(format!("{event} {}", self.label.get()));
        }
    }
}

impl ContextAware for Daemon {
    fn set_context(&self, context: &Context) {
        *self.events.lock() = context.get::<Events>();
    }
}

impl Service for Daemon {
    fn start_service(&self) -> ServiceResult {
        self.emit("start");
        if self.fail.get() {
            return Err(ServiceError::start(format!("{} refused", self.label.get())));
        }
        self.running.set_silent(true);
        Ok(())
    }

    fn stop_service(&self) -> ServiceResult {
        self.emit("stop");
        if self.fail_stop.get() {
            return Err(ServiceError::stop(format!("{} stuck", self.label.get())));
        }
        self.running.set_silent(false);
        Ok(())
    }
}

fn container(events: &Arc<Events>) -> Arc<Container> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let container = Container::with_context(Context::new().with_shared(events.clone()));
    container.register_type("daemon", Daemon::class_entry());
    container
}

fn daemon(container: &Container, name: &str) -> Arc<Daemon> {
    container.get_named(name).and_then(object_arc_cast::<Daemon>).unwrap()
}

#[test]
fn test_services_start_in_registration_order() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    container.configure_with_data(json!({
        "first": {"*type": "daemon", "label": "first", "next": "named:second"},
        "second": {"*type": "daemon", "label": "second"},
        "third": {"*type": "daemon", "label": "third"}
    }));
    assert_eq!(container.service_count(), 3);
    assert!(events.take().is_empty());

    container.start();
    assert!(container.is_running());
    assert_eq!(events.take(), vec!["start first", "start second", "start third"]);
    assert!(daemon(&container, "second").running.get());

    container.stop();
    assert!(!container.is_running());
    assert_eq!(events.take(), vec!["stop first", "stop second", "stop third"]);
    assert!(!daemon(&container, "second").running.get());
}

#[test]
fn test_failing_service_does_not_stop_others() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    container.configure_with_data(json!({
        "bad": {"*type": "daemon", "label": "bad", "fail": true},
        "good": {"*type": "daemon", "label": "good"}
    }));

    container.start();
    assert_eq!(events.take(), vec!["start bad", "start good"]);
    assert!(!daemon(&container, "bad").running.get());
    assert!(daemon(&container, "good").running.get());
}

#[test]
fn test_failing_stop_does_not_skip_others() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorder = states.clone();
    container.running_changed().connect(move |running: &bool| recorder.lock().push(*running));
    container.configure_with_data(json!({
        "first": {"*type": "daemon", "label": "first"},
        "stuck": {"*type": "daemon", "label": "stuck", "fail-stop": true},
        "last": {"*type": "daemon", "label": "last"}
    }));

    container.start();
    events.take();
    container.stop();
    assert_eq!(events.take(), vec!["stop first", "stop stuck", "stop last"]);
    assert!(!container.is_running());
    assert_eq!(*states.lock(), vec![true, false]);
    assert!(daemon(&container, "stuck").running.get());
    assert!(!daemon(&container, "last").running.get());
}

#[test]
fn test_service_built_while_running_starts() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    container.configure_with_data(json!({
        "early": {"*type": "daemon", "label": "early"}
    }));
    container.start();
    events.take();

    container.configure_with_data(json!({
        "early": {"*type": "daemon", "label": "early"},
        "late": {"*type": "daemon", "label": "late"}
    }));
    assert_eq!(events.take(), vec!["start late"]);
    assert!(daemon(&container, "late").running.get());
}

#[test]
fn test_running_changed_signal() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorder = states.clone();
    container.running_changed().connect(move |running: &bool| recorder.lock().push(*running));

    container.start();
    container.stop();
    assert_eq!(*states.lock(), vec![true, false]);
}

#[test]
fn test_nested_container_stops_with_parent() {
    let events = Arc::new(Events::default());
    let container = container(&events);
    container.configure_with_data(json!({
        "child": {
            "*type": "container",
            "named": {"inner": {"*type": "daemon", "label": "inner"}}
        },
        "outer": {"*type": "daemon", "label": "outer"}
    }));

    // The child container is itself a service of the parent.
    assert_eq!(container.service_count(), 2);
    container.start();
    assert_eq!(events.take(), vec!["start inner", "start outer"]);

    let child = container.get_named("child").and_then(object_arc_cast::<Container>).unwrap();
    assert!(child.is_running());
    container.stop();
    assert!(!child.is_running());
    assert_eq!(events.take(), vec!["stop inner", "stop outer"]);
}
