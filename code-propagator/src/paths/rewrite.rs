//! Destination-relative path computation.

use super::PathMatcher;

/// Computes the path of `file_path` relative to the deepest ancestor matching
/// `prefix`.
///
/// * An absent or empty prefix strips only the leading separator.
/// * When the whole path matches the prefix, only its final segment is kept.
/// * A prefix that matches no ancestor yields the full relative path.
///
/// ```
/// use code_propagator::paths::strip_prefix;
///
/// assert_eq!(strip_prefix(Some("/a/*/c"), "/a/b/c/d/e"), "d/e");
/// assert_eq!(strip_prefix(Some("/b/c"), "/a/b/c/d/e"), "a/b/c/d/e");
/// ```
#[must_use]
pub fn strip_prefix(prefix: Option<&str>, file_path: &str) -> String {
    let prefix = prefix.map(|p| p.trim_end_matches('/')).unwrap_or_default();
    if prefix.is_empty() {
        return file_path.trim_start_matches('/').to_string();
    }

    let matcher = PathMatcher::new(prefix);
    if matcher.matches(file_path) {
        return basename(file_path).to_string();
    }

    let mut segments = Vec::new();
    let mut current = file_path;
    loop {
        let parent = dirname(current);
        segments.push(basename(current));
        if matcher.matches(parent) {
            break;
        }
        if parent.is_empty() || parent == "/" || parent == current {
            break;
        }
        current = parent;
    }

    segments.reverse();
    segments.join("/")
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_through_wildcard_prefix() {
        assert_eq!(strip_prefix(Some("/a/*/c"), "/a/b/c/d/e"), "d/e");
    }

    #[test]
    fn complete_match_keeps_basename() {
        assert_eq!(strip_prefix(Some("/a/*/c"), "/a/b/c"), "c");
    }

    #[test]
    fn absent_prefix_strips_leading_separator() {
        assert_eq!(strip_prefix(None, "/a/b/c/d/e"), "a/b/c/d/e");
        assert_eq!(strip_prefix(Some(""), "/a/b/c/d/e"), "a/b/c/d/e");
        assert_eq!(strip_prefix(Some("/"), "/a/b"), "a/b");
    }

    #[test]
    fn mismatched_prefix_degrades_to_full_relative_path() {
        assert_eq!(strip_prefix(Some("/b/c"), "/a/b/c/d/e"), "a/b/c/d/e");
    }

    #[test]
    fn trailing_slash_on_prefix_is_ignored() {
        assert_eq!(
            strip_prefix(Some("/google/cloud/"), "/google/cloud/speech/v1/a.proto"),
            "speech/v1/a.proto"
        );
    }

    #[test]
    fn unrooted_paths_stop_at_the_first_segment() {
        assert_eq!(strip_prefix(Some("/x"), "a/b"), "a/b");
    }

    #[test]
    fn helpers_follow_posix_semantics() {
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("/a/b"), "/a");
        assert_eq!(dirname("a"), "");
        assert_eq!(basename("/a/b"), "b");
    }
}
