//! Integration tests for loading configuration files.

use std::fs;

use horizon_weave::file::{
    configure_from_file, load_configuration, save_configuration, ConfigFormat, FileErrorKind,
};
use horizon_weave::prelude::*;
use tempfile::TempDir;

#[derive(Object, Default)]
struct Endpoint {
    #[property]
    host: Property<String>,

    #[property]
    port: Property<u32>,

    #[property]
    upstream: Property<Option<ObjectRef>>,
}

fn container() -> std::sync::Arc<Container> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let container = Container::new();
    container.register_type("endpoint", Endpoint::class_entry());
    container
}

#[test]
fn test_build_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("services.toml");
    fs::write(
        &path,
        r#"
        [origin]
        "*type" = "endpoint"
        host = "origin.internal"
        port = 8080

        [edge]
        "*type" = "endpoint"
        host = "edge.example"
        port = 443
        upstream = "named:origin"
        "#,
    )
    .unwrap();

    let container = container();
    configure_from_file(&container, &path).unwrap();

    let edge = container.get_named("edge").and_then(object_arc_cast::<Endpoint>).unwrap();
    assert_eq!(edge.port.get(), 443);
    let upstream = edge.upstream.get().unwrap();
    assert!(same_object(&upstream, &container.get_named("origin").unwrap()));
}

#[test]
fn test_json_and_toml_load_the_same_tree() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("app.json");
    let toml = dir.path().join("app.toml");
    fs::write(&json, r#"{"svc": {"*type": "endpoint", "port": 1, "tags": ["a", "b"]}}"#).unwrap();
    fs::write(&toml, "[svc]\n\"*type\" = \"endpoint\"\nport = 1\ntags = [\"a\", \"b\"]\n").unwrap();

    assert_eq!(load_configuration(&json).unwrap(), load_configuration(&toml).unwrap());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let config = Configuration::from_json_str(r#"{"svc": {"*type": "endpoint", "host": "h"}}"#).unwrap();

    for format in [ConfigFormat::Json, ConfigFormat::Toml] {
        let path = dir.path().join(format!("saved.{}", format.extension()));
        save_configuration(&config, &path).unwrap();
        assert_eq!(load_configuration(&path).unwrap(), config);
    }
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = load_configuration(dir.path().join("absent.json")).unwrap_err();
    assert!(missing.is_not_found());

    let yaml = dir.path().join("app.yaml");
    fs::write(&yaml, "svc: {}").unwrap();
    let unsupported = load_configuration(&yaml).unwrap_err();
    assert_eq!(unsupported.kind(), FileErrorKind::UnsupportedFormat);

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"svc\": ").unwrap();
    let invalid = load_configuration(&broken).unwrap_err();
    assert_eq!(invalid.kind(), FileErrorKind::InvalidData);
    assert_eq!(invalid.path(), Some(broken.as_path()));
}
