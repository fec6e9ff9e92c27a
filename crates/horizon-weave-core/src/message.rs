//! Path-addressed messages.
//!
//! A [`Message`] carries a target path, a verb name and named parameters.
//! Routers consume the target one segment at a time: each hop looks up the
//! [`head`](TargetPath::head) among its named objects and forwards the message
//! with the [`rest`](TargetPath::rest) of the path.
//!
//! The textual form is `<target>+<key>=<value>+...@<name>`, for example
//! `main.content+view=named:home@open`. An empty target addresses the root
//! container itself.

use std::fmt;

use indexmap::IndexMap;

use crate::value::{FromPropertyValue, PropertyValue};

/// Errors raised when parsing the textual message form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageParseError {
    /// The text has no `@<name>` suffix, or the name is empty.
    #[error("message '{0}' has no name")]
    MissingName(String),
    /// A `+key=value` parameter is malformed.
    #[error("malformed message parameter '{0}'")]
    InvalidParameter(String),
}

/// A dot or slash separated path of named-object segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TargetPath {
    segments: Vec<String>,
}

impl TargetPath {
    /// Parse a path. Empty segments are dropped, so `""` and `"."` are both
    /// the empty path.
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text
                .split(['.', '/'])
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Build a path from segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// The first segment.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The path after the first segment.
    pub fn rest(&self) -> TargetPath {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// All segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// An addressed instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    target: TargetPath,
    name: String,
    parameters: IndexMap<String, PropertyValue>,
}

impl Message {
    /// A message for the root container with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            target: TargetPath::default(),
            name: name.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Set the target path.
    pub fn with_target(mut self, target: TargetPath) -> Self {
        self.target = target;
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Parse the textual form `<target>+<key>=<value>...@<name>`.
    ///
    /// Parameter values are kept as strings; a container resolves reference
    /// strings among them when the message is posted.
    pub fn parse(text: &str) -> Result<Self, MessageParseError> {
        let (address, name) = text
            .rsplit_once('@')
            .ok_or_else(|| MessageParseError::MissingName(text.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(MessageParseError::MissingName(text.to_owned()));
        }

        let mut parts = address.split('+');
        let target = TargetPath::parse(parts.next().unwrap_or_default());
        let mut parameters = IndexMap::new();
        for part in parts {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| MessageParseError::InvalidParameter(part.to_owned()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(MessageParseError::InvalidParameter(part.to_owned()));
            }
            parameters.insert(key.to_owned(), PropertyValue::String(value.to_owned()));
        }

        Ok(Self {
            target,
            name: name.to_owned(),
            parameters,
        })
    }

    /// The target path.
    pub fn target(&self) -> &TargetPath {
        &self.target
    }

    /// Whether the message is addressed to the receiving router itself.
    pub fn has_empty_target(&self) -> bool {
        self.target.is_empty()
    }

    /// The first segment of the target path.
    pub fn target_head(&self) -> Option<&str> {
        self.target.head()
    }

    /// A copy of this message addressed to the rest of the target path.
    pub fn pop_target_head(&self) -> Message {
        Self {
            target: self.target.rest(),
            name: self.name.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// The verb.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the verb equals `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    /// All parameters in declaration order.
    pub fn parameters(&self) -> &IndexMap<String, PropertyValue> {
        &self.parameters
    }

    /// Mutable access to the parameters.
    pub fn parameters_mut(&mut self) -> &mut IndexMap<String, PropertyValue> {
        &mut self.parameters
    }

    /// A raw parameter value.
    pub fn parameter(&self, key: &str) -> Option<&PropertyValue> {
        self.parameters.get(key)
    }

    /// A parameter converted to `T`. `None` when absent or not convertible.
    pub fn parameter_as<T: FromPropertyValue>(&self, key: &str) -> Option<T> {
        self.parameters
            .get(key)
            .and_then(|value| T::from_property_value(value.clone()).ok())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        for (key, value) in &self.parameters {
            write!(f, "+{key}={value}")?;
        }
        write!(f, "@{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_head_rest() {
        let path = TargetPath::parse("main.content/detail");
        assert_eq!(path.len(), 3);
        assert_eq!(path.head(), Some("main"));
        assert_eq!(path.rest().head(), Some("content"));
        assert_eq!(path.rest().rest().rest(), TargetPath::default());
        assert!(TargetPath::parse("").is_empty());
        assert!(TargetPath::parse(" . ").is_empty());
    }

    #[test]
    fn test_parse_message() {
        let message = Message::parse("main.content+view=named:home+animated=yes@open").unwrap();
        assert_eq!(message.name(), "open");
        assert_eq!(message.target().segments(), ["main", "content"]);
        assert_eq!(message.parameter_as::<String>("view").as_deref(), Some("named:home"));
        assert_eq!(
            message.parameters().keys().collect::<Vec<_>>(),
            vec!["view", "animated"]
        );
    }

    #[test]
    fn test_parse_empty_target() {
        let message = Message::parse("+view=home@open").unwrap();
        assert!(message.has_empty_target());
        assert!(message.has_name("open"));

        let bare = Message::parse("@refresh").unwrap();
        assert!(bare.has_empty_target());
        assert!(bare.parameters().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Message::parse("main.content"),
            Err(MessageParseError::MissingName("main.content".into()))
        );
        assert!(matches!(Message::parse("main@ "), Err(MessageParseError::MissingName(_))));
        assert_eq!(
            Message::parse("main+view@open"),
            Err(MessageParseError::InvalidParameter("view".into()))
        );
        assert!(matches!(
            Message::parse("main+=x@open"),
            Err(MessageParseError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_pop_target_head() {
        let message = Message::parse("a.b@go").unwrap();
        assert_eq!(message.target_head(), Some("a"));
        let popped = message.pop_target_head();
        assert_eq!(popped.target_head(), Some("b"));
        assert!(popped.pop_target_head().has_empty_target());
        assert_eq!(popped.name(), "go");
    }

    #[test]
    fn test_display() {
        let message = Message::new("open")
            .with_target(TargetPath::parse("main"))
            .with_parameter("view", "home");
        assert_eq!(message.to_string(), "main+view=home@open");
    }
}
