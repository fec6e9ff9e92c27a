//! Integration tests for path-addressed message routing.

use std::sync::Arc;

use horizon_weave_core::{
    object_arc_cast, same_object, Container, Message, MessageParseError, MessageReceiver, MessageRouter,
    Object, ObjectRef, Property, PropertyValue,
};
use horizon_weave_macros::Object;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Object, Default)]
#[object(receiver)]
struct Inbox {
    #[property]
    accepts: Property<String>,

    received: Mutex<Vec<Message>>,
}

impl Inbox {
    fn received(&self) -> Vec<Message> {
        self.received.lock().clone()
    }
}

impl MessageReceiver for Inbox {
    fn receive_message(&self, message: &Message, _sender: Option<&dyn Object>) -> bool {
        let accepts = self.accepts.get();
        if !accepts.is_empty() && !message.has_name(&accepts) {
            return false;
        }
        self.received.lock().push(message.clone());
        true
    }
}

/// Forwards everything to one configured object.
#[derive(Object, Default)]
#[object(router)]
struct Relay {
    #[property]
    to: Property<Option<ObjectRef>>,
}

impl MessageRouter for Relay {
    fn route_message(&self, message: &Message, sender: Option<&dyn Object>) -> bool {
        let Some(to) = self.to.get() else {
            return false;
        };
        let rest = message.pop_target_head();
        to.as_receiver()
            .is_some_and(|receiver| receiver.receive_message(&rest, sender))
    }
}

#[derive(Object, Default)]
struct Button {
    #[property]
    on_click: Property<Option<Message>>,
}

fn container() -> Arc<Container> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let container = Container::new();
    container.register_type("inbox", Inbox::class_entry());
    container.register_type("relay", Relay::class_entry());
    container.register_type("button", Button::class_entry());
    container
}

fn inbox(container: &Container, name: &str) -> Arc<Inbox> {
    container.get_named(name).and_then(object_arc_cast::<Inbox>).unwrap()
}

#[test]
fn test_direct_delivery() {
    let container = container();
    container.configure_with_data(json!({"inbox": {"*type": "inbox"}}));

    assert_eq!(container.post_message("inbox@ping", None), Ok(true));
    let received = inbox(&container, "inbox").received();
    assert_eq!(received.len(), 1);
    assert!(received[0].has_name("ping"));
    assert!(received[0].has_empty_target());
}

#[test]
fn test_nested_path_delivered_exactly_once() {
    let container = container();
    container.configure_with_data(json!({
        "inbox": {"*type": "inbox"},
        "panel": {
            "*type": "container",
            "named": {"inbox": {"*type": "inbox"}}
        }
    }));

    assert_eq!(container.post_message("panel.inbox@ping", None), Ok(true));

    let panel = container.get_named("panel").and_then(object_arc_cast::<Container>).unwrap();
    assert_eq!(inbox(&panel, "inbox").received().len(), 1);
    assert!(inbox(&container, "inbox").received().is_empty());
}

#[test]
fn test_unhandled_messages_report_false() {
    let container = container();
    container.configure_with_data(json!({
        "picky": {"*type": "inbox", "accepts": "save"},
        "broken": {"*type": "no-such-type"}
    }));

    assert_eq!(container.post_message("nobody@ping", None), Ok(false));
    assert_eq!(container.post_message("broken@ping", None), Ok(false));
    assert_eq!(container.post_message("picky@load", None), Ok(false));
    assert_eq!(container.post_message("picky@save", None), Ok(true));
    // An inbox is not a router, so a longer path stops there.
    assert_eq!(container.post_message("picky.deeper@save", None), Ok(false));
}

#[test]
fn test_custom_router_forwards() {
    let container = container();
    container.configure_with_data(json!({
        "sink": {"*type": "inbox"},
        "relay": {"*type": "relay", "to": "named:sink"}
    }));

    assert_eq!(container.post_message("relay.anything@ping", None), Ok(true));
    assert_eq!(inbox(&container, "sink").received().len(), 1);
}

#[test]
fn test_empty_target_goes_to_handler() {
    let container = container();
    assert_eq!(container.post_message("@reset", None), Ok(false));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    container.set_message_handler(move |message, _sender| {
        recorder.lock().push(message.name().to_owned());
        true
    });
    assert_eq!(container.post_message("@reset", None), Ok(true));
    assert_eq!(*seen.lock(), vec!["reset"]);

    container.clear_message_handler();
    assert_eq!(container.post_message("@reset", None), Ok(false));
}

#[test]
fn test_parameters_resolve_references() {
    let container = container();
    container.configure_with_data(json!({
        "inbox": {"*type": "inbox"},
        "other": {"*type": "inbox"}
    }));

    assert_eq!(
        container.post_message("inbox+from=named:other+count=3+label=plain@ping", None),
        Ok(true)
    );
    let received = inbox(&container, "inbox").received();
    let message = &received[0];
    let from = message.parameter("from").and_then(PropertyValue::as_object).unwrap();
    assert!(same_object(from, &container.get_named("other").unwrap()));
    assert_eq!(message.parameter_as::<i64>("count"), Some(3));
    assert_eq!(message.parameter_as::<String>("label").as_deref(), Some("plain"));
}

#[test]
fn test_post_reference_builds_message_property() {
    let container = container();
    container.configure_with_data(json!({
        "inbox": {"*type": "inbox"},
        "button": {"*type": "button", "on_click": "post:inbox+who=named:button@clicked"}
    }));

    let button = container.get_named("button").and_then(object_arc_cast::<Button>).unwrap();
    let message = button.on_click.get().unwrap();
    assert!(message.has_name("clicked"));
    assert_eq!(message.target().to_string(), "inbox");

    assert!(container.route_message(&message, Some(&*button)));
    assert_eq!(inbox(&container, "inbox").received().len(), 1);
}

#[test]
fn test_malformed_message_is_an_error() {
    let container = container();
    assert!(matches!(
        container.post_message("inbox@", None),
        Err(MessageParseError::MissingName(_))
    ));
    assert!(matches!(
        container.post_message("inbox+novalue@ping", None),
        Err(MessageParseError::InvalidParameter(_))
    ));
}
