//! Post-processor lock file.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// The pinned post-processor version of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockInfo {
    /// Image name, e.g. `gcr.io/example/post-processor`.
    pub image: String,

    /// Image digest, e.g. `sha256:...`.
    pub digest: String,
}

impl LockInfo {
    /// Creates lock information for an image digest.
    pub fn new(image: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            digest: digest.into(),
        }
    }
}

/// Parsed content of a repository's lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    pub docker: LockInfo,
}

impl LockFile {
    /// Parses and validates lock-file YAML. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the YAML is malformed or a field is empty.
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::YamlError {
            path: path.to_string(),
            source: e,
        })?;
        if file.docker.image.trim().is_empty() || file.docker.digest.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                path: path.to_string(),
                message: "docker 'image' and 'digest' are required".to_string(),
            });
        }
        Ok(file)
    }

    /// Serializes the lock file to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::YamlError`] if serialization fails.
    pub fn to_yaml(&self, path: &str) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::YamlError {
            path: path.to_string(),
            source: e,
        })
    }
}
