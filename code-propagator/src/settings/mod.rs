//! Run settings loaded from `propagator.toml`.
//!
//! ```toml
//! source-repo = "googleapis/googleapis-gen"
//! host-url = "https://github.com/"
//! scan-depth = 100
//! recent-artifact-limit = 20
//! early-stop = true
//! store-path = "propagation-state.json"
//! ```

mod error;

pub use error::SettingsError;

use crate::dedup::DEFAULT_RECENT_LIMIT;
use crate::host::RepoName;
use crate::scanner::EarlyStop;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Default settings file name.
pub const DEFAULT_SETTINGS_PATH: &str = "propagator.toml";

/// Settings of a propagation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Generation repository in "owner/name" form.
    pub source_repo: String,

    /// Base web URL of the code host.
    #[serde(default = "default_host_url")]
    pub host_url: String,

    /// Maximum number of source commits scanned per run.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,

    /// Number of recent pull requests and issues checked directly.
    #[serde(default = "default_recent_artifact_limit")]
    pub recent_artifact_limit: u8,

    /// Stop scanning at the first fully propagated commit.
    #[serde(default = "default_early_stop")]
    pub early_stop: bool,

    /// Location of the file-backed config store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_host_url() -> String {
    "https://github.com/".to_string()
}

fn default_scan_depth() -> usize {
    100
}

fn default_recent_artifact_limit() -> u8 {
    DEFAULT_RECENT_LIMIT
}

fn default_early_stop() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("propagation-state.json")
}

impl Settings {
    /// Loads and validates settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parses and validates settings.
    ///
    /// `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if parsing or validation fails.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(contents).map_err(|source| SettingsError::Toml {
            path: path.display().to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.source_repo()?;
        Url::parse(&self.host_url).map_err(|e| SettingsError::Invalid {
            key: "host-url",
            message: e.to_string(),
        })?;
        if self.scan_depth == 0 {
            return Err(SettingsError::Invalid {
                key: "scan-depth",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The generation repository.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] if `source-repo` is not "owner/name".
    pub fn source_repo(&self) -> Result<RepoName, SettingsError> {
        self.source_repo
            .parse()
            .map_err(|e: crate::host::HostError| SettingsError::Invalid {
                key: "source-repo",
                message: e.to_string(),
            })
    }

    /// The early-stop policy.
    #[must_use]
    pub fn early_stop(&self) -> EarlyStop {
        EarlyStop::from(self.early_stop)
    }
}
