//! Runner error types.

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// No token was supplied for a command that talks to the code host.
    #[error("A token is required (--token or GITHUB_TOKEN)")]
    MissingToken,

    /// Defective copy-rule file.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Local copy failed.
    #[error(transparent)]
    Copy(#[from] crate::copy::CopyError),

    /// Invalid settings.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Code host client errors.
    #[error(transparent)]
    Host(#[from] crate::host::HostError),

    /// Config store errors.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Source history could not be scanned.
    #[error(transparent)]
    Scan(#[from] crate::scanner::ScanError),

    /// A repository's configuration could not be refreshed.
    #[error(transparent)]
    Refresh(#[from] crate::refresh::RefreshError),

    /// Lock updates could not be started.
    #[error(transparent)]
    LockUpdate(#[from] crate::lock_update::LockUpdateError),
}
