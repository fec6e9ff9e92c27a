//! Error types for Horizon Weave.
//!
//! Each subsystem has its own error enum. [`WeaveError`] collects them for
//! callers that want a single error type.

use crate::message::MessageParseError;

/// The main error type for Horizon Weave operations.
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    /// Configuration document error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Object build error.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    /// Property assignment error.
    #[error("Property error: {0}")]
    Property(#[from] PropertyError),
    /// Pending reference error.
    #[error("Pending reference error: {0}")]
    Pending(#[from] PendingError),
    /// Service lifecycle error.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
    /// Message parsing error.
    #[error("Message error: {0}")]
    Message(#[from] MessageParseError),
}

/// Errors raised while reading configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The document root must be a mapping of names to definitions.
    #[error("configuration root must be a mapping, found {found}")]
    NotAMapping {
        /// The JSON kind that was found instead.
        found: &'static str,
    },
}

/// Errors raised while instantiating an object from its definition.
///
/// These never abort a container build: the builder logs them and the
/// affected object is simply absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The definition has neither `*type` nor `*and-class`.
    #[error("Instantiating {identifier}, definition has no *type or *and-class")]
    MissingType {
        /// Key path of the definition.
        identifier: String,
    },
    /// No class is mapped for the type name.
    #[error("Instantiating {identifier}, no class found for type {type_name}")]
    UnknownType {
        /// Key path of the definition.
        identifier: String,
        /// The unresolved type name.
        type_name: String,
    },
    /// The class name has no registered constructors.
    #[error("Instantiating {identifier}, class not found: {class_name}")]
    UnknownClass {
        /// Key path of the definition.
        identifier: String,
        /// The unresolved class name.
        class_name: String,
    },
    /// The class is registered without any constructor.
    #[error("Instantiating {identifier}, class {class_name} has no constructor")]
    NoConstructor {
        /// Key path of the definition.
        identifier: String,
        /// The class that could not be constructed.
        class_name: String,
    },
    /// `*factory` did not resolve to an object factory.
    #[error("Building {identifier}, invalid factory")]
    InvalidFactory {
        /// Key path of the definition.
        identifier: String,
    },
}

/// Errors raised when assigning a property value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The object has no property with this name.
    #[error("unknown property '{0}'")]
    NotFound(String),
    /// The value could not be converted to the property's type.
    #[error("property type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// The expected type name.
        expected: &'static str,
        /// The kind of value that was provided.
        got: &'static str,
    },
    /// The value has the right kind but is out of range or malformed.
    #[error("invalid property value: {0}")]
    InvalidValue(String),
}

impl PropertyError {
    /// Create a type mismatch error.
    pub fn mismatch(expected: &'static str, got: &'static str) -> Self {
        Self::TypeMismatch { expected, got }
    }
}

/// Errors raised by pending reference slots.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PendingError {
    /// A slot was read before the named build it waits on completed.
    #[error("pending reference to '{0}' read before its build completed")]
    Unfilled(String),
    /// A slot was filled more than once.
    #[error("pending reference to '{0}' already filled")]
    AlreadyFilled(String),
}

/// Errors reported by services when starting or stopping.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service could not start.
    #[error("failed to start service: {0}")]
    Start(String),
    /// The service could not stop.
    #[error("failed to stop service: {0}")]
    Stop(String),
    /// Any other failure raised by the service implementation.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    /// Create a start failure.
    pub fn start(message: impl Into<String>) -> Self {
        Self::Start(message.into())
    }

    /// Create a stop failure.
    pub fn stop(message: impl Into<String>) -> Self {
        Self::Stop(message.into())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for property assignment.
pub type PropertyResult<T> = std::result::Result<T, PropertyError>;

/// Result type for service lifecycle calls.
pub type ServiceResult = std::result::Result<(), ServiceError>;

/// A specialized Result type for Horizon Weave operations.
pub type Result<T> = std::result::Result<T, WeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::UnknownType {
            identifier: "svc2".into(),
            type_name: "worker".into(),
        };
        assert_eq!(
            err.to_string(),
            "Instantiating svc2, no class found for type worker"
        );
    }

    #[test]
    fn test_weave_error_from() {
        let err: WeaveError = PropertyError::NotFound("title".into()).into();
        assert!(matches!(err, WeaveError::Property(PropertyError::NotFound(_))));
        assert_eq!(err.to_string(), "Property error: unknown property 'title'");
    }

    #[test]
    fn test_service_error_source() {
        let io = std::io::Error::other("disk gone");
        let err = ServiceError::from(Box::new(io) as Box<dyn std::error::Error + Send + Sync>);
        assert_eq!(err.to_string(), "disk gone");
    }
}
