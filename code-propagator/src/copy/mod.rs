//! Materializes copy rules from a source checkout into a destination checkout.
//!
//! Copying runs in two phases. First every rule's destination is cleared so
//! files deleted upstream disappear downstream; then every rule's matching
//! source paths are copied in declared order. Later rules may overwrite the
//! output of earlier ones.

mod error;

pub use error::CopyError;

use crate::config::CopyRule;
use crate::paths::{rooted_from_relative, strip_prefix, PathMatcher};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

const GIT_DIR: &str = ".git";

/// What a [`copy_dirs`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destination paths removed while clearing.
    pub removed: Vec<PathBuf>,

    /// Number of directories created or confirmed.
    pub directories: usize,

    /// Number of files copied.
    pub files: usize,
}

/// Applies `rules` from `source_root` onto `dest_root`.
///
/// # Errors
///
/// Returns [`CopyError`] if a rule's destination escapes `dest_root` or a
/// filesystem operation fails.
pub fn copy_dirs(
    source_root: &Path,
    dest_root: &Path,
    rules: &[CopyRule],
) -> Result<CopyReport, CopyError> {
    let _span = info_span!(
        "copy_dirs",
        source = %source_root.display(),
        dest = %dest_root.display(),
        rules = rules.len()
    )
    .entered();

    let mut report = CopyReport::default();

    for rule in rules {
        clear_destination(dest_root, rule, &mut report)?;
    }

    for rule in rules {
        copy_rule(source_root, dest_root, rule, &mut report)?;
    }

    info!(
        removed = report.removed.len(),
        directories = report.directories,
        files = report.files,
        "Copy complete"
    );
    Ok(report)
}

/// Resolves a rule's `dest` beneath `dest_root`, rejecting `..` components.
fn resolve_dest(dest_root: &Path, dest: &str) -> Result<PathBuf, CopyError> {
    let relative = Path::new(dest.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(CopyError::InvalidDestination {
            dest: dest.to_string(),
        });
    }
    Ok(dest_root.join(relative))
}

/// Last literal-ish segment of a source pattern, ignoring trailing wildcard-only segments.
///
/// `/google/cloud/grpc-foo-java/**` yields `grpc-foo-java`.
fn source_basename(source: &str) -> Option<&str> {
    source
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty() && *segment != "*" && *segment != "**")
}

fn clear_destination(
    dest_root: &Path,
    rule: &CopyRule,
    report: &mut CopyReport,
) -> Result<(), CopyError> {
    if !rule.targets_root() {
        let target = resolve_dest(dest_root, &rule.dest)?;
        if remove_path(&target)? {
            debug!(path = %target.display(), "Cleared destination");
            report.removed.push(target);
        }
        return Ok(());
    }

    // Root destinations only lose entries named like the rule's source.
    let Some(name) = source_basename(&rule.source) else {
        warn!(source = %rule.source, "Root copy rule has no basename, nothing cleared");
        return Ok(());
    };
    let matcher = PathMatcher::new(name);

    let entries = match fs::read_dir(dest_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CopyError::io("read directory", dest_root, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| CopyError::io("read directory", dest_root, e))?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name == GIT_DIR || !matcher.matches(&file_name) {
            continue;
        }
        let target = entry.path();
        if remove_path(&target)? {
            debug!(path = %target.display(), "Cleared root entry");
            report.removed.push(target);
        }
    }
    Ok(())
}

/// Removes a file or directory tree. Returns `false` if nothing was there.
fn remove_path(path: &Path) -> Result<bool, CopyError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(CopyError::io("inspect", path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| CopyError::io("remove", path, e))?;
    Ok(true)
}

fn copy_rule(
    source_root: &Path,
    dest_root: &Path,
    rule: &CopyRule,
    report: &mut CopyReport,
) -> Result<(), CopyError> {
    let matcher = PathMatcher::subtree(&rule.source);
    let dest_base = resolve_dest(dest_root, &rule.dest)?;
    debug!(pattern = matcher.as_str(), dest = %dest_base.display(), "Applying copy rule");

    let walker = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != GIT_DIR);

    for entry in walker {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        let rooted = rooted_from_relative(relative);
        if !matcher.matches(&rooted) {
            continue;
        }

        let relative_dest = strip_prefix(rule.strip_prefix.as_deref(), &rooted);
        let target = dest_base.join(relative_dest);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| CopyError::io("create", &target, e))?;
            report.directories += 1;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| CopyError::io("create", parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| CopyError::io("copy", &target, e))?;
            report.files += 1;
        }
    }
    Ok(())
}
