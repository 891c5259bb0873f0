//! Declarative files read from destination repositories.
//!
//! Each destination repository carries two files:
//! ```text
//! .github/
//! ├── propagation.yaml       # copy rules + optional post-processor image
//! └── propagation.lock.yaml  # pinned post-processor digest (optional)
//! ```

mod copy_rule;
mod error;
mod lock;

pub use copy_rule::{CopyConfigFile, CopyRule, DockerImage};
pub use error::ConfigError;
pub use lock::{LockFile, LockInfo};

use std::path::Path;
use tracing::debug;

/// Location of the copy-rule file inside a repository.
pub const COPY_CONFIG_PATH: &str = ".github/propagation.yaml";

/// Location of the lock file inside a repository.
pub const LOCK_FILE_PATH: &str = ".github/propagation.lock.yaml";

/// Declarative files of one repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFiles {
    /// Copy rules and post-processor declaration.
    pub copy_config: CopyConfigFile,

    /// Pinned post-processor, if the repository has a lock file.
    pub lock: Option<LockInfo>,
}

/// Loads the copy-rule file from a repository checkout.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] when the file does not exist, and other
/// [`ConfigError`] variants when it cannot be read, parsed or validated.
pub fn load_copy_config(repo_root: &Path) -> Result<CopyConfigFile, ConfigError> {
    let path = repo_root.join(COPY_CONFIG_PATH);
    debug!(path = %path.display(), "Loading copy rules");

    if !path.exists() {
        return Err(ConfigError::MissingFile {
            path: COPY_CONFIG_PATH.to_string(),
        });
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;
    CopyConfigFile::parse(&content, COPY_CONFIG_PATH)
}

/// Loads the lock file from a repository checkout, if present.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
pub fn load_lock_file(repo_root: &Path) -> Result<Option<LockFile>, ConfigError> {
    let path = repo_root.join(LOCK_FILE_PATH);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;
    LockFile::parse(&content, LOCK_FILE_PATH).map(Some)
}

/// Writes `lock` to the lock file of a repository checkout.
///
/// # Errors
///
/// Returns [`ConfigError`] if serialization or the write fails.
pub fn write_lock_file(repo_root: &Path, lock: &LockInfo) -> Result<(), ConfigError> {
    let path = repo_root.join(LOCK_FILE_PATH);
    let yaml = LockFile {
        docker: lock.clone(),
    }
    .to_yaml(LOCK_FILE_PATH)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(&path, yaml).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Loads both declarative files from a repository checkout.
///
/// # Errors
///
/// Returns [`ConfigError`] if either file is defective. A missing lock file is
/// not a defect.
pub fn load_repo_files(repo_root: &Path) -> Result<RepoFiles, ConfigError> {
    let copy_config = load_copy_config(repo_root)?;
    let lock = load_lock_file(repo_root)?.map(|file| file.docker);
    Ok(RepoFiles { copy_config, lock })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_copy_config(root: &Path, content: &str) {
        fs::create_dir_all(root.join(".github")).unwrap();
        fs::write(root.join(COPY_CONFIG_PATH), content).unwrap();
    }

    #[test]
    fn missing_copy_config_is_a_defect() {
        let temp = TempDir::new().unwrap();
        let result = load_copy_config(temp.path());
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    fn missing_lock_file_is_not_a_defect() {
        let temp = TempDir::new().unwrap();
        write_copy_config(temp.path(), "copy-dirs:\n  - source: /a\n    dest: b\n");

        let files = load_repo_files(temp.path()).unwrap();
        assert_eq!(files.copy_config.copy_dirs.len(), 1);
        assert!(files.lock.is_none());
    }

    #[test]
    fn written_lock_file_is_loaded() {
        let temp = TempDir::new().unwrap();
        write_copy_config(temp.path(), "copy-dirs: []\n");
        let lock = LockInfo::new("gcr.io/x/pp", "sha256:123");

        write_lock_file(temp.path(), &lock).unwrap();

        let files = load_repo_files(temp.path()).unwrap();
        assert_eq!(files.lock, Some(lock));
    }

    #[test]
    fn malformed_lock_file_is_a_defect() {
        let temp = TempDir::new().unwrap();
        write_copy_config(temp.path(), "copy-dirs: []\n");
        fs::write(temp.path().join(LOCK_FILE_PATH), "docker: [").unwrap();

        let result = load_repo_files(temp.path());
        assert!(matches!(result, Err(ConfigError::YamlError { .. })));
    }
}
