//! Settings error types.

use thiserror::Error;

/// Errors that can occur while loading run settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file.
    #[error("Failed to read settings '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the settings file.
    #[error("Failed to parse settings '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an invalid value.
    #[error("Invalid setting '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}
