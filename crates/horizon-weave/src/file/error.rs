//! Error types for configuration file loading.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use horizon_weave_core::ConfigError;

type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Error type for configuration file operations.
#[derive(Debug)]
pub struct FileError {
    /// The kind of error that occurred.
    kind: FileErrorKind,
    /// The path involved in the error, if any.
    path: Option<PathBuf>,
    /// The underlying source error, if any.
    source: Option<BoxedSource>,
}

/// The kind of file error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    /// File or directory not found.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path or filename.
    InvalidPath,
    /// The path is a directory, not a file.
    IsDirectory,
    /// The file extension names no supported configuration format.
    UnsupportedFormat,
    /// The document could not be parsed or is not a mapping.
    InvalidData,
    /// The configuration could not be serialized.
    Serialize,
    /// An unknown or unclassified error occurred.
    Other,
}

impl FileError {
    /// Creates a new file error.
    pub fn new(kind: FileErrorKind, path: Option<PathBuf>, source: Option<BoxedSource>) -> Self {
        Self { kind, path, source }
    }

    /// Creates a file error from an I/O error and path.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let mut error = Self::from(err);
        error.path = Some(path.into());
        error
    }

    /// Creates an "unsupported format" error for the given path.
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::UnsupportedFormat, Some(path.into()), None)
    }

    /// Creates an "invalid data" error wrapping a parse failure.
    pub fn invalid_data(source: impl Into<BoxedSource>, path: Option<&Path>) -> Self {
        Self::new(
            FileErrorKind::InvalidData,
            path.map(Path::to_path_buf),
            Some(source.into()),
        )
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> FileErrorKind {
        self.kind
    }

    /// Returns the path involved in the error, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true if this error indicates the file was not found.
    pub fn is_not_found(&self) -> bool {
        self.kind == FileErrorKind::NotFound
    }

    /// Attach a path if none is recorded yet.
    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_path_buf());
        }
        self
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(path) = &self.path {
            write!(f, ": {}", path.display())?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileErrorKind::NotFound => write!(f, "file not found"),
            FileErrorKind::PermissionDenied => write!(f, "permission denied"),
            FileErrorKind::InvalidPath => write!(f, "invalid path"),
            FileErrorKind::IsDirectory => write!(f, "is a directory"),
            FileErrorKind::UnsupportedFormat => write!(f, "unsupported configuration format"),
            FileErrorKind::InvalidData => write!(f, "invalid configuration"),
            FileErrorKind::Serialize => write!(f, "configuration serialization failed"),
            FileErrorKind::Other => write!(f, "file error"),
        }
    }
}

impl StdError for FileError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => FileErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => FileErrorKind::PermissionDenied,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidFilename => {
                FileErrorKind::InvalidPath
            }
            io::ErrorKind::IsADirectory => FileErrorKind::IsDirectory,
            io::ErrorKind::InvalidData => FileErrorKind::InvalidData,
            _ => FileErrorKind::Other,
        };
        Self {
            kind,
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<ConfigError> for FileError {
    fn from(err: ConfigError) -> Self {
        Self::invalid_data(err, None)
    }
}

impl From<toml::de::Error> for FileError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_data(err, None)
    }
}

impl From<serde_json::Error> for FileError {
    fn from(err: serde_json::Error) -> Self {
        let kind = if err.is_data() || err.is_syntax() || err.is_eof() {
            FileErrorKind::InvalidData
        } else {
            FileErrorKind::Serialize
        };
        Self::new(kind, None, Some(Box::new(err)))
    }
}

impl From<toml::ser::Error> for FileError {
    fn from(err: toml::ser::Error) -> Self {
        Self::new(FileErrorKind::Serialize, None, Some(Box::new(err)))
    }
}

/// A specialized Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind() {
        let err = FileError::from_io(io::Error::from(io::ErrorKind::NotFound), "app.json");
        assert!(err.is_not_found());
        assert_eq!(err.path(), Some(Path::new("app.json")));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display() {
        let err = FileError::unsupported_format("app.yaml");
        assert_eq!(err.to_string(), "unsupported configuration format: app.yaml");
        let err = FileError::from(ConfigError::NotAMapping { found: "sequence" });
        assert_eq!(
            err.to_string(),
            "invalid configuration (configuration root must be a mapping, found sequence)"
        );
    }
}
