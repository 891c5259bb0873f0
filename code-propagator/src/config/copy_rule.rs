//! Copy rules and the copy-rule file that declares them.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// A single mirroring instruction from the generation repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CopyRule {
    /// Path glob in the source repository, rooted at `/`.
    pub source: String,

    /// Destination directory relative to the repository root. Empty means the root.
    #[serde(default)]
    pub dest: String,

    /// Pattern stripped from the front of matched paths before they are placed under `dest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
}

impl CopyRule {
    /// Creates a rule without a strip-prefix.
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            strip_prefix: None,
        }
    }

    /// Sets the strip-prefix pattern.
    #[must_use]
    pub fn with_strip_prefix(mut self, strip_prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(strip_prefix.into());
        self
    }

    /// Returns whether `dest` addresses the repository root.
    #[must_use]
    pub fn targets_root(&self) -> bool {
        Path::new(self.dest.trim_start_matches('/'))
            .components()
            .all(|c| matches!(c, Component::CurDir))
    }

    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                path: path.to_string(),
                message: "copy rule 'source' cannot be empty".to_string(),
            });
        }
        if Path::new(&self.dest)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ConfigError::ValidationError {
                path: path.to_string(),
                message: format!("copy rule 'dest' escapes the repository: {}", self.dest),
            });
        }
        Ok(())
    }
}

/// Post-processor image declared by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerImage {
    /// Image name without digest, e.g. `gcr.io/example/post-processor`.
    pub image: String,
}

/// Parsed content of a repository's copy-rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CopyConfigFile {
    /// Optional post-processor run after code is copied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerImage>,

    /// Copy rules, applied in declared order.
    #[serde(default)]
    pub copy_dirs: Vec<CopyRule>,
}

impl CopyConfigFile {
    /// Parses and validates copy-rule YAML. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the YAML is malformed or a rule is invalid.
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::YamlError {
            path: path.to_string(),
            source: e,
        })?;
        for rule in &file.copy_dirs {
            rule.validate(path)?;
        }
        if let Some(docker) = &file.docker {
            if docker.image.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    path: path.to_string(),
                    message: "docker 'image' cannot be empty".to_string(),
                });
            }
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_in_declared_order() {
        let file = CopyConfigFile::parse(
            r#"
docker:
  image: gcr.io/example/post-processor
copy-dirs:
  - source: /google/cloud/speech
    dest: src
    strip-prefix: /google/cloud
  - source: /grpc-speech-java
    dest: ""
"#,
            "propagation.yaml",
        )
        .unwrap();

        assert_eq!(
            file.docker.unwrap().image,
            "gcr.io/example/post-processor"
        );
        assert_eq!(file.copy_dirs.len(), 2);
        assert_eq!(
            file.copy_dirs[0],
            CopyRule::new("/google/cloud/speech", "src").with_strip_prefix("/google/cloud")
        );
        assert!(file.copy_dirs[1].targets_root());
    }

    #[test]
    fn dest_defaults_to_root() {
        let file = CopyConfigFile::parse("copy-dirs:\n  - source: /a\n", "f").unwrap();
        assert_eq!(file.copy_dirs[0].dest, "");
        assert!(file.copy_dirs[0].targets_root());
    }

    #[test]
    fn rejects_empty_source() {
        let result = CopyConfigFile::parse("copy-dirs:\n  - source: ''\n    dest: x\n", "f");
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_dest_escaping_repository() {
        let result = CopyConfigFile::parse("copy-dirs:\n  - source: /a\n    dest: ../x\n", "f");
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = CopyConfigFile::parse("copy-dirs: [", "f");
        assert!(matches!(result, Err(ConfigError::YamlError { .. })));
    }

    #[test]
    fn targets_root_variants() {
        assert!(CopyRule::new("/a", "").targets_root());
        assert!(CopyRule::new("/a", "/").targets_root());
        assert!(CopyRule::new("/a", ".").targets_root());
        assert!(!CopyRule::new("/a", "src").targets_root());
    }
}
