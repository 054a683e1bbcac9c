//! Error types for configuration handling.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading, mutating or writing node configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A TOML document could not be parsed.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },

    /// A TOML document could not be serialized.
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        /// Path of the document.
        path: PathBuf,
        /// Serializer error.
        #[source]
        source: toml::ser::Error,
    },

    /// A section the node always writes is absent.
    #[error("Missing section [{section}] in {path}")]
    MissingSection {
        /// Path of the document.
        path: PathBuf,
        /// Section name.
        section: String,
    },

    /// A key holds a value of the wrong type.
    #[error("Key '{key}' in {path} is not a {expected}")]
    UnexpectedType {
        /// Path of the document.
        path: PathBuf,
        /// Dotted key.
        key: String,
        /// Expected TOML type.
        expected: &'static str,
    },

    /// A value cannot be represented in the document.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Dotted key.
        key: String,
        /// Error message.
        message: String,
    },

    /// Bootstrap settings file is invalid.
    #[error("Invalid settings: {message}")]
    InvalidSettings {
        /// Error message.
        message: String,
    },

    /// Backend identifier outside the supported set.
    #[error("Unknown storage backend '{name}'")]
    UnknownBackend {
        /// Identifier as supplied.
        name: String,
    },
}

impl ConfigError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid settings error.
    pub fn invalid_settings<S: Into<String>>(message: S) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }
}

/// Result type for configuration handling.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
