//! Pull request and issue text.
//!
//! Bodies are rendered with Handlebars from the built-in templates below;
//! titles and branch names are plain formatting helpers.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, PropagationPrData, TemplateRenderer};

use crate::config::LockInfo;

/// Exact title of the issue filed for configuration defects.
///
/// Open issues with this title are reused instead of filing a new one.
pub const DEFECT_ISSUE_TITLE: &str = "Code propagation is blocked by an invalid configuration";

/// Body of a propagation pull request.
pub const PROPAGATION_PR_TEMPLATE: &str = r#"{{#if body}}{{body}}

{{/if}}Source-Link: {{source_link}}

---
Generated code copied from `{{source_repo}}` at `{{source_commit}}`.
{{#if removed}}
Cleared before copying:
{{#each removed}}
- `{{this}}`
{{/each}}
{{/if}}"#;

/// Body of a configuration defect issue.
pub const DEFECT_ISSUE_TEMPLATE: &str = r#"Generated code is not being copied into this repository.

{{#if (eq kind "missing")}}The file `{{path}}` does not exist. Add it to declare which directories should be copied.{{else}}The file `{{path}}` could not be used:

```
{{error}}
```{{/if}}

Propagation resumes on the next run after the file is fixed.
"#;

/// Body of a lock-update pull request.
pub const LOCK_PR_TEMPLATE: &str = r#"Pins the post-processor `{{image}}` to `{{digest}}`.

Previous digest: {{#if previous_digest}}`{{previous_digest}}`{{else}}none{{/if}}
"#;

/// Length of abbreviated hashes and digests in names.
const SHORT_LEN: usize = 7;

/// Abbreviates a commit hash or image digest.
///
/// A `sha256:`-style algorithm prefix is dropped.
#[must_use]
pub fn short_hash(hash: &str) -> &str {
    let hash = hash.split_once(':').map_or(hash, |(_, rest)| rest);
    hash.get(..SHORT_LEN).unwrap_or(hash)
}

/// Generates the branch name for propagating a source commit.
///
/// Format: "code-propagation/{short_hash}"
#[must_use]
pub fn generate_propagation_branch(source_commit: &str) -> String {
    format!("code-propagation/{}", short_hash(source_commit))
}

/// Generates the branch name for a lock update.
///
/// Format: "code-propagation/lock-{short_digest}"
#[must_use]
pub fn generate_lock_branch(lock: &LockInfo) -> String {
    format!("code-propagation/lock-{}", short_hash(&lock.digest))
}

/// Generates the PR title for a lock update.
///
/// Format: "chore: update post-processor to {short_digest}"
#[must_use]
pub fn generate_lock_pr_title(lock: &LockInfo) -> String {
    format!("chore: update post-processor to {}", short_hash(&lock.digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("sha256:fedcba9876"), "fedcba9");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_generate_propagation_branch() {
        assert_eq!(
            generate_propagation_branch("0123456789abcdef"),
            "code-propagation/0123456"
        );
    }

    #[test]
    fn test_generate_lock_names() {
        let lock = LockInfo::new("gcr.io/cloud/owlbot-java", "sha256:abcdef0123456789");
        assert_eq!(generate_lock_branch(&lock), "code-propagation/lock-abcdef0");
        assert_eq!(
            generate_lock_pr_title(&lock),
            "chore: update post-processor to abcdef0"
        );
    }
}
