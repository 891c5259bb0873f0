//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while reading a repository's declarative files.
///
/// Every variant is a configuration defect: the affected repository is
/// skipped and an issue is filed on it, while the run carries on.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("Failed to parse '{path}': {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Validation error in a parsed file.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },

    /// Missing required file.
    #[error("Missing required file: {path}")]
    MissingFile { path: String },
}
