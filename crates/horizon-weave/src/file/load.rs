//! Loading configuration documents from disk.
//!
//! JSON documents are read directly. TOML documents are converted to the
//! same value model, with datetimes kept as their RFC 3339 text.

use std::fs;
use std::path::Path;

use horizon_weave_core::{Configuration, Container};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::error::{FileError, FileResult};

/// A supported configuration document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON (`.json`).
    Json,
    /// TOML (`.toml`).
    Toml,
}

impl ConfigFormat {
    /// The format for a file extension, compared case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// The format implied by a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// The usual file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Parse a configuration document. The root must be a mapping.
pub fn parse_configuration(text: &str, format: ConfigFormat) -> FileResult<Configuration> {
    let value = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Toml => toml_to_json(toml::from_str(text)?),
    };
    Ok(Configuration::from_mapping(value)?)
}

/// Read and parse a configuration file, choosing the format by extension.
pub fn load_configuration(path: impl AsRef<Path>) -> FileResult<Configuration> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path).ok_or_else(|| FileError::unsupported_format(path))?;
    load_configuration_as(path, format)
}

/// Read and parse a configuration file in the given format.
#[tracing::instrument(target = "horizon_weave::file", level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_configuration_as(path: impl AsRef<Path>, format: ConfigFormat) -> FileResult<Configuration> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| FileError::from_io(err, path))?;
    let configuration = parse_configuration(&text, format).map_err(|err| err.with_path(path))?;
    tracing::debug!(
        target: "horizon_weave::file",
        names = configuration.value_names().len(),
        "loaded configuration"
    );
    Ok(configuration)
}

/// Load a configuration file and build its named objects into `container`.
pub fn configure_from_file(container: &Container, path: impl AsRef<Path>) -> FileResult<()> {
    let configuration = load_configuration(path)?;
    container.configure_with(configuration);
    Ok(())
}

/// Convert any serializable value into a configuration.
pub fn to_configuration<T: Serialize + ?Sized>(value: &T) -> FileResult<Configuration> {
    Ok(Configuration::from_mapping(serde_json::to_value(value)?)?)
}

/// Serialize a configuration in the given format.
///
/// TOML has no null; mappings holding nulls fail to serialize.
pub fn render_configuration(configuration: &Configuration, format: ConfigFormat) -> FileResult<String> {
    match format {
        ConfigFormat::Json => Ok(serde_json::to_string_pretty(configuration.root())?),
        ConfigFormat::Toml => Ok(toml::to_string_pretty(configuration.root())?),
    }
}

/// Write a configuration file, choosing the format by extension.
pub fn save_configuration(configuration: &Configuration, path: impl AsRef<Path>) -> FileResult<()> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path).ok_or_else(|| FileError::unsupported_format(path))?;
    let text = render_configuration(configuration, format).map_err(|err| err.with_path(path))?;
    fs::write(path, text).map_err(|err| FileError::from_io(err, path))?;
    tracing::debug!(target: "horizon_weave::file", path = %path.display(), "saved configuration");
    Ok(())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(n) => Value::Number(n.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileErrorKind;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path("app.json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path("conf/App.TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path("app.yaml"), None);
        assert_eq!(ConfigFormat::from_path("Makefile"), None);
    }

    #[test]
    fn test_parse_toml_keeps_reserved_keys() {
        let config = parse_configuration(
            r#"
            [svc1]
            "*type" = "logger"
            levels = ["info", "warn"]
            since = 1979-05-27T07:32:00Z
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.get_str("svc1.*type"), Some("logger"));
        assert_eq!(config.get_str("svc1.levels.1"), Some("warn"));
        assert_eq!(config.get_str("svc1.since"), Some("1979-05-27T07:32:00Z"));
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        let err = parse_configuration("[1, 2]", ConfigFormat::Json).unwrap_err();
        assert_eq!(err.kind(), FileErrorKind::InvalidData);
    }

    #[test]
    fn test_to_configuration() {
        #[derive(Serialize)]
        struct Service {
            #[serde(rename = "*type")]
            type_name: &'static str,
            port: u16,
        }
        let mut named = std::collections::BTreeMap::new();
        named.insert("web", Service { type_name: "server", port: 8080 });

        let config = to_configuration(&named).unwrap();
        assert_eq!(config.get_str("web.*type"), Some("server"));
        assert_eq!(config.get_i64("web.port"), Some(8080));
    }
}
