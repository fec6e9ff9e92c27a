//! Resolved property values.
//!
//! The configurer turns raw configuration values into [`PropertyValue`]s:
//! scalars are copied, references become the objects they point at and
//! nested definitions become freshly built objects. Objects then convert the
//! value to their field type through [`FromPropertyValue`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{PropertyError, PropertyResult};
use crate::message::Message;
use crate::object::{same_object, Object, ObjectRef};

/// A value ready to assign to an object property.
#[derive(Clone, Default)]
pub enum PropertyValue {
    /// No value. Never assigned by the configurer.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A sequence of resolved values.
    List(Vec<PropertyValue>),
    /// A mapping of resolved values in document order.
    Map(IndexMap<String, PropertyValue>),
    /// A built object.
    Object(ObjectRef),
    /// A message literal from a `post:` reference.
    Message(Message),
}

impl PropertyValue {
    /// Short name of the value kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::List(_) => "list",
            PropertyValue::Map(_) => "map",
            PropertyValue::Object(_) => "object",
            PropertyValue::Message(_) => "message",
        }
    }

    /// Whether this is [`PropertyValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// The object, if this value holds one.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            PropertyValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The string, if this value holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Convert a plain data value. Strings are copied verbatim; reference
    /// resolution is the configurer's job.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(flag) => PropertyValue::Bool(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => PropertyValue::Integer(integer),
                None => PropertyValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(text) => PropertyValue::String(text.clone()),
            Value::Array(items) => PropertyValue::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => PropertyValue::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("Null"),
            PropertyValue::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
            PropertyValue::Integer(integer) => f.debug_tuple("Integer").field(integer).finish(),
            PropertyValue::Float(float) => f.debug_tuple("Float").field(float).finish(),
            PropertyValue::String(text) => f.debug_tuple("String").field(text).finish(),
            PropertyValue::List(items) => f.debug_tuple("List").field(items).finish(),
            PropertyValue::Map(map) => f.debug_tuple("Map").field(map).finish(),
            PropertyValue::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
            PropertyValue::Message(message) => f.debug_tuple("Message").field(message).finish(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("null"),
            PropertyValue::Bool(flag) => write!(f, "{flag}"),
            PropertyValue::Integer(integer) => write!(f, "{integer}"),
            PropertyValue::Float(float) => write!(f, "{float}"),
            PropertyValue::String(text) => f.write_str(text),
            PropertyValue::Object(object) => write!(f, "<{}>", object.type_name()),
            PropertyValue::Message(message) => write!(f, "post:{message}"),
            PropertyValue::List(_) | PropertyValue::Map(_) => write!(f, "{self:?}"),
        }
    }
}

// Objects compare by identity.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::List(a), PropertyValue::List(b)) => a == b,
            (PropertyValue::Map(a), PropertyValue::Map(b)) => a == b,
            (PropertyValue::Object(a), PropertyValue::Object(b)) => same_object(a, b),
            (PropertyValue::Message(a), PropertyValue::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<ObjectRef> for PropertyValue {
    fn from(value: ObjectRef) -> Self {
        PropertyValue::Object(value)
    }
}

impl From<Message> for PropertyValue {
    fn from(value: Message) -> Self {
        PropertyValue::Message(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        PropertyValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Null, Into::into)
    }
}

/// Type-directed conversion from a resolved value to a property type.
pub trait FromPropertyValue: Sized {
    /// Convert the value, or explain why it doesn't fit.
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self>;
}

impl FromPropertyValue for PropertyValue {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        Ok(value)
    }
}

impl FromPropertyValue for String {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::String(text) => Ok(text),
            PropertyValue::Bool(flag) => Ok(flag.to_string()),
            PropertyValue::Integer(integer) => Ok(integer.to_string()),
            PropertyValue::Float(float) => Ok(float.to_string()),
            other => Err(PropertyError::mismatch("string", other.kind())),
        }
    }
}

impl FromPropertyValue for bool {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Bool(flag) => Ok(flag),
            PropertyValue::String(text) => match text.as_str() {
                "true" | "yes" => Ok(true),
                "false" | "no" => Ok(false),
                _ => Err(PropertyError::InvalidValue(format!("'{text}' is not a boolean"))),
            },
            other => Err(PropertyError::mismatch("bool", other.kind())),
        }
    }
}

impl FromPropertyValue for i64 {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Integer(integer) => Ok(integer),
            PropertyValue::Float(float) if float.fract() == 0.0 => Ok(float as i64),
            PropertyValue::String(text) => text
                .trim()
                .parse()
                .map_err(|_| PropertyError::InvalidValue(format!("'{text}' is not an integer"))),
            other => Err(PropertyError::mismatch("integer", other.kind())),
        }
    }
}

macro_rules! integer_from_property_value {
    ($($ty:ty),*) => {
        $(
            impl FromPropertyValue for $ty {
                fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
                    let integer = i64::from_property_value(value)?;
                    <$ty>::try_from(integer).map_err(|_| {
                        PropertyError::InvalidValue(format!(
                            "{integer} is out of range for {}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

integer_from_property_value!(i32, u32, u64, usize);

impl FromPropertyValue for f64 {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Float(float) => Ok(float),
            PropertyValue::Integer(integer) => Ok(integer as f64),
            PropertyValue::String(text) => text
                .trim()
                .parse()
                .map_err(|_| PropertyError::InvalidValue(format!("'{text}' is not a number"))),
            other => Err(PropertyError::mismatch("float", other.kind())),
        }
    }
}

impl FromPropertyValue for f32 {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        f64::from_property_value(value).map(|float| float as f32)
    }
}

impl FromPropertyValue for ObjectRef {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Object(object) => Ok(object),
            other => Err(PropertyError::mismatch("object", other.kind())),
        }
    }
}

impl FromPropertyValue for Message {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Message(message) => Ok(message),
            PropertyValue::String(text) => {
                Message::parse(&text).map_err(|err| PropertyError::InvalidValue(err.to_string()))
            }
            other => Err(PropertyError::mismatch("message", other.kind())),
        }
    }
}

impl FromPropertyValue for Value {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Null => Ok(Value::Null),
            PropertyValue::Bool(flag) => Ok(Value::Bool(flag)),
            PropertyValue::Integer(integer) => Ok(Value::from(integer)),
            PropertyValue::Float(float) => Ok(Value::from(float)),
            PropertyValue::String(text) => Ok(Value::String(text)),
            PropertyValue::List(items) => items
                .into_iter()
                .map(Value::from_property_value)
                .collect::<PropertyResult<Vec<_>>>()
                .map(Value::Array),
            PropertyValue::Map(map) => map
                .into_iter()
                .map(|(key, value)| Value::from_property_value(value).map(|value| (key, value)))
                .collect::<PropertyResult<serde_json::Map<_, _>>>()
                .map(Value::Object),
            other => Err(PropertyError::mismatch("data", other.kind())),
        }
    }
}

impl<T: FromPropertyValue> FromPropertyValue for Option<T> {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Null => Ok(None),
            value => T::from_property_value(value).map(Some),
        }
    }
}

impl<T: FromPropertyValue> FromPropertyValue for Vec<T> {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::List(items) => items.into_iter().map(T::from_property_value).collect(),
            other => Err(PropertyError::mismatch("list", other.kind())),
        }
    }
}

impl<T: FromPropertyValue> FromPropertyValue for IndexMap<String, T> {
    fn from_property_value(value: PropertyValue) -> PropertyResult<Self> {
        match value {
            PropertyValue::Map(map) => map
                .into_iter()
                .map(|(key, value)| T::from_property_value(value).map(|value| (key, value)))
                .collect(),
            other => Err(PropertyError::mismatch("map", other.kind())),
        }
    }
}

/// Downcast an object-valued property to a concrete type.
///
/// Returns `None` for non-object values and for objects of another type.
pub fn downcast_object<T: Object>(value: &PropertyValue) -> Option<Arc<T>> {
    let object = value.as_object()?.clone();
    crate::object::object_arc_cast::<T>(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Marker;
    impl Object for Marker {}

    #[test]
    fn test_objects_compare_by_identity() {
        let object: ObjectRef = Arc::new(Marker);
        let typed = Arc::new(Marker);
        let coerced: ObjectRef = typed.clone();

        assert_eq!(PropertyValue::Object(object.clone()), PropertyValue::Object(object.clone()));
        assert_eq!(PropertyValue::Object(coerced.clone()), PropertyValue::Object(typed));
        assert_ne!(PropertyValue::Object(object.clone()), PropertyValue::Object(coerced));
        assert_eq!(
            PropertyValue::List(vec![PropertyValue::Object(object.clone())]),
            PropertyValue::List(vec![PropertyValue::Object(object)])
        );
    }

    #[test]
    fn test_from_json() {
        let value = PropertyValue::from_json(&json!({"a": [1, 2.5, "x", null, true]}));
        let PropertyValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map["a"],
            PropertyValue::List(vec![
                PropertyValue::Integer(1),
                PropertyValue::Float(2.5),
                PropertyValue::String("x".into()),
                PropertyValue::Null,
                PropertyValue::Bool(true),
            ])
        );
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(i64::from_property_value(PropertyValue::String(" 42 ".into())), Ok(42));
        assert_eq!(f64::from_property_value(PropertyValue::Integer(3)), Ok(3.0));
        assert_eq!(u32::from_property_value(PropertyValue::Float(7.0)), Ok(7));
        assert_eq!(String::from_property_value(PropertyValue::Integer(9)), Ok("9".to_owned()));
        assert_eq!(bool::from_property_value(PropertyValue::String("yes".into())), Ok(true));
    }

    #[test]
    fn test_conversion_errors() {
        assert_eq!(
            i64::from_property_value(PropertyValue::Bool(true)),
            Err(PropertyError::mismatch("integer", "bool"))
        );
        assert!(matches!(
            u32::from_property_value(PropertyValue::Integer(-1)),
            Err(PropertyError::InvalidValue(_))
        ));
        assert!(matches!(
            bool::from_property_value(PropertyValue::String("maybe".into())),
            Err(PropertyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_container_conversions() {
        let list = PropertyValue::from(vec!["a", "b"]);
        assert_eq!(Vec::<String>::from_property_value(list), Ok(vec!["a".into(), "b".into()]));
        assert_eq!(Option::<i64>::from_property_value(PropertyValue::Null), Ok(None));
        let map = PropertyValue::from_json(&json!({"x": 1, "y": 2}));
        let typed = IndexMap::<String, i64>::from_property_value(map).unwrap();
        assert_eq!(typed.get("y"), Some(&2));
    }

    #[test]
    fn test_message_from_string() {
        let message = Message::from_property_value(PropertyValue::from("main@open")).unwrap();
        assert_eq!(message.name(), "open");
    }

    #[test]
    fn test_json_round_back() {
        let raw = json!({"k": [true, "v"]});
        let converted = Value::from_property_value(PropertyValue::from_json(&raw)).unwrap();
        assert_eq!(converted, raw);
    }
}
