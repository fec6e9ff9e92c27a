//! Integration tests for the #[derive(Object)] macro.

use std::marker::PhantomData;

use horizon_weave_core::{Container, Object, Property, PropertyError, PropertyValue, Service, ServiceResult};
use horizon_weave_macros::Object;

#[derive(Object, Default)]
struct Window {
    #[property]
    title: Property<String>,

    #[property(name = "max-width")]
    max_width: Property<u32>,

    #[property]
    visible: Property<bool>,

    #[property(skip)]
    cache: Property<Vec<String>>,

    frames: u64,
}

#[derive(Object, Default)]
#[object(service, no_factory)]
struct Ticker {
    #[property]
    interval: Property<f64>,
}

impl Service for Ticker {
    fn start_service(&self) -> ServiceResult {
        Ok(())
    }

    fn stop_service(&self) -> ServiceResult {
        Ok(())
    }
}

#[derive(Object, Default)]
struct Tagged<T: Send + Sync + 'static> {
    #[property]
    tag: Property<Option<String>>,

    marker: PhantomData<fn() -> T>,
}

#[derive(Object, Default)]
struct Empty;

#[test]
fn test_set_property_by_key() {
    let window = Window::default();
    window.set_property("title", "Main".into()).unwrap();
    window.set_property("max-width", PropertyValue::Integer(640)).unwrap();
    window.set_property("visible", "yes".into()).unwrap();

    assert_eq!(window.title.get(), "Main");
    assert_eq!(window.max_width.get(), 640);
    assert!(window.visible.get());
    assert_eq!(window.frames, 0);
}

#[test]
fn test_property_names_follow_declaration() {
    let window = Window::default();
    assert_eq!(window.property_names(), &["title", "max-width", "visible"]);
    assert!(Empty.property_names().is_empty());
}

#[test]
fn test_skipped_and_unknown_keys_are_not_found() {
    let window = Window::default();
    for key in ["cache", "max_width", "frames"] {
        assert!(matches!(
            window.set_property(key, PropertyValue::Null),
            Err(PropertyError::NotFound(name)) if name == key
        ));
    }
    assert!(window.cache.get().is_empty());
}

#[test]
fn test_conversion_errors() {
    let window = Window::default();
    assert!(matches!(
        window.set_property("max-width", PropertyValue::Integer(-1)),
        Err(PropertyError::InvalidValue(_))
    ));
    assert!(matches!(
        window.set_property("title", PropertyValue::List(Vec::new())),
        Err(PropertyError::TypeMismatch { expected: "string", .. })
    ));
    assert_eq!(window.max_width.get(), 0);
}

#[test]
fn test_capability_accessors() {
    let ticker = Ticker::default();
    assert!(ticker.as_service().is_some());
    assert!(ticker.as_receiver().is_none());
    assert!(Window::default().as_service().is_none());

    ticker.set_property("interval", PropertyValue::Integer(2)).unwrap();
    assert_eq!(ticker.interval.get(), 2.0);
}

#[test]
fn test_generic_struct() {
    let tagged = Tagged::<u8>::default();
    tagged.set_property("tag", "blue".into()).unwrap();
    assert_eq!(tagged.tag.get().as_deref(), Some("blue"));
}

#[test]
fn test_class_entry_registers_type() {
    let container = Container::new();
    container.register_type("window", Window::class_entry());
    container.configure_with_data(serde_json::json!({
        "main": {"*type": "window", "title": "Main", "max-width": 800}
    }));

    let main = container
        .get_named("main")
        .and_then(horizon_weave_core::object_arc_cast::<Window>)
        .unwrap();
    assert_eq!(main.title.get(), "Main");
    assert_eq!(main.max_width.get(), 800);
    assert!(main.type_name().ends_with("Window"));
}
