//! Runner configuration.

use crate::settings::Settings;

/// Configuration for a propagation run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Loaded run settings.
    settings: Settings,
    /// Token used for API calls and git pushes.
    token: String,
    /// Whether to preview work without changing anything.
    dry_run: bool,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(settings: Settings, token: String, dry_run: bool) -> Self {
        Self {
            settings,
            token,
            dry_run,
        }
    }

    /// Returns the run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the configured token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
