//! Read-only configuration trees.
//!
//! A [`Configuration`] wraps a JSON-model value tree and answers lookups by
//! key path. Paths are dotted or slash separated; a numeric segment or a
//! `[n]` suffix indexes into sequences, so `views.0.title` and
//! `views[0]/title` address the same node.
//!
//! # Example
//!
//! ```
//! use horizon_weave_core::Configuration;
//!
//! let config = Configuration::from_json_str(
//!     r#"{"svc": {"*type": "logger", "levels": ["info", "warn"]}}"#,
//! ).unwrap();
//!
//! assert_eq!(config.get_str("svc.*type"), Some("logger"));
//! assert_eq!(config.get_str("svc/levels[1]"), Some("warn"));
//! assert!(config.get_configuration("svc").unwrap().is_object_definition());
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// Reserved key naming the short type of an object definition.
pub const TYPE_KEY: &str = "*type";
/// Reserved key naming the class of an object definition. Wins over `*type`.
pub const CLASS_KEY: &str = "*and-class";
/// Reserved key naming a factory that builds the object.
pub const FACTORY_KEY: &str = "*factory";

/// Prefix shared by all reserved keys.
pub const RESERVED_PREFIX: char = '*';

/// An immutable tree of configuration values.
///
/// Cloning is cheap: clones share the same tree.
#[derive(Clone, PartialEq)]
pub struct Configuration {
    root: Arc<Value>,
}

impl Configuration {
    /// Wrap a value tree.
    pub fn new(root: Value) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// An empty mapping.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Parse a JSON document. The root must be a mapping.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_mapping(value)
    }

    /// Wrap a value tree, requiring the root to be a mapping.
    pub fn from_mapping(value: Value) -> ConfigResult<Self> {
        if value.is_object() {
            Ok(Self::new(value))
        } else {
            Err(ConfigError::NotAMapping {
                found: value_kind(&value),
            })
        }
    }

    /// The root value of this tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up the value at a key path. The empty path is the root.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut current: &Value = &self.root;
        for segment in path_segments(path) {
            current = match segment {
                Segment::Key(key) => current.as_object()?.get(key)?,
                Segment::Index(index) => current.as_array()?.get(index)?,
            };
        }
        Some(current)
    }

    /// The value of a top-level key, taken literally: separators and digits
    /// in `key` are part of the name.
    pub fn get_entry(&self, key: &str) -> Option<&Value> {
        self.root.as_object()?.get(key)
    }

    /// Whether a value exists at the key path.
    pub fn has_value(&self, path: &str) -> bool {
        self.get_value(path).is_some()
    }

    /// String value at the key path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_value(path)?.as_str()
    }

    /// Boolean value at the key path.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_value(path)?.as_bool()
    }

    /// Integer value at the key path.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get_value(path)?.as_i64()
    }

    /// Floating point value at the key path. Integers widen.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get_value(path)?.as_f64()
    }

    /// The sub-tree rooted at the key path.
    pub fn get_configuration(&self, path: &str) -> Option<Configuration> {
        self.get_value(path).map(|value| Self::new(value.clone()))
    }

    /// Top-level keys in document order. Empty unless the root is a mapping.
    pub fn value_names(&self) -> Vec<String> {
        match self.root.as_ref() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this tree has no top-level entries.
    pub fn is_empty(&self) -> bool {
        match self.root.as_ref() {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Merge `other` over this tree.
    ///
    /// Mappings merge key by key, recursively. On collision the right-hand
    /// value wins; sequences and scalars are replaced wholesale.
    pub fn mixin(&self, other: &Configuration) -> Configuration {
        let mut merged = self.root.as_ref().clone();
        merge_into(&mut merged, other.root.as_ref());
        Self::new(merged)
    }

    /// Whether this node defines an object: a mapping carrying `*type`,
    /// `*and-class` or `*factory`.
    pub fn is_object_definition(&self) -> bool {
        is_object_definition(&self.root)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration({})", self.root)
    }
}

impl From<Value> for Configuration {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Whether a raw value is an object definition.
pub fn is_object_definition(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        map.contains_key(TYPE_KEY) || map.contains_key(CLASS_KEY) || map.contains_key(FACTORY_KEY)
    })
}

/// Whether a key is reserved for the builder.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// A short name for the JSON kind of a value, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn path_segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    path.split(['.', '/'])
        .filter(|part| !part.is_empty())
        .flat_map(split_indices)
}

// "views[0][2]" -> Key("views"), Index(0), Index(2). A bare numeric segment
// is an index. Brackets that don't parse are kept as part of the key.
fn split_indices(part: &str) -> Vec<Segment<'_>> {
    if let Ok(index) = part.parse::<usize>() {
        return vec![Segment::Index(index)];
    }
    let Some(open) = part.find('[') else {
        return vec![Segment::Key(part)];
    };
    let mut segments = Vec::new();
    if open > 0 {
        segments.push(Segment::Key(&part[..open]));
    }
    let mut rest = &part[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return vec![Segment::Key(part)];
        };
        match inner[..close].parse::<usize>() {
            Ok(index) => segments.push(Segment::Index(index)),
            Err(_) => return vec![Segment::Key(part)],
        }
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return vec![Segment::Key(part)];
    }
    segments
}
