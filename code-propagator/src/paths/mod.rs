//! Repository path patterns.
//!
//! Copy rules address files as if the repository root were a single leading
//! slash (`/google/cloud/foo`). This module normalizes rule patterns so they
//! cover whole subtrees, matches candidate paths against them and rewrites
//! matched paths relative to a strip-prefix.

mod matcher;
mod rewrite;

pub use matcher::{normalize_pattern, PathMatcher};
pub use rewrite::strip_prefix;

use std::path::Path;

/// Converts a repository-relative path into the rooted form used by copy rules.
///
/// `google/cloud/foo.proto` becomes `/google/cloud/foo.proto`. Paths that are
/// already rooted are returned unchanged.
#[must_use]
pub fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Converts a filesystem path relative to a checkout root into rooted form,
/// always using `/` as the separator.
#[must_use]
pub fn rooted_from_relative(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    rooted(&joined)
}
