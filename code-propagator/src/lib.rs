#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod context;
pub mod copy;
pub mod dedup;
pub mod git;
pub mod host;
pub mod issues;
pub mod lock_update;
pub mod paths;
pub mod propagate;
pub mod refresh;
pub mod runner;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod summary;
pub mod templates;

pub use config::{
    load_copy_config, load_lock_file, load_repo_files, write_lock_file, ConfigError,
    CopyConfigFile, CopyRule, LockInfo, RepoFiles,
};
pub use context::Context;
pub use copy::{copy_dirs, CopyError, CopyReport};
pub use dedup::{DedupChecker, PropagationCheck};
pub use git::{CommandGit, CommitInfo, GitError, GitExecutor};
pub use host::{CodeHost, GitHubHost, HostError, RemoteHost, RepoName};
pub use issues::{report_config_defect, IssueError, IssueStatus};
pub use lock_update::{update_locks, LockUpdateError};
pub use paths::{normalize_pattern, strip_prefix, PathMatcher};
pub use propagate::{PropagateError, Propagator};
pub use refresh::{refresh_all, refresh_repo_config, RefreshError, RefreshOutcome};
pub use runner::{copy_local, Runner, RunnerConfig, RunnerError};
pub use scanner::{apply_queue, CommitScanner, EarlyStop, ScanError, ScanReport, SourceCheckout, Todo};
pub use settings::{Settings, SettingsError};
pub use store::{
    ConfigStore, ExpectedVersion, FileConfigStore, MemoryConfigStore, RepoConfig, StoreError,
    WriteOutcome,
};
pub use summary::{ProcessingResult, RunSummary};
pub use templates::{TemplateError, TemplateRenderer};
