//! Segment-wise glob matching with whole-subtree normalization.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Widens a copy-rule source pattern so it matches the named directory and
/// everything beneath it.
///
/// | written as | normalized to |
/// |------------|---------------|
/// | `/a/b/**`  | `/a/b/**`     |
/// | `/a/b/*`   | `/a/b/**`     |
/// | `/a/b/`    | `/a/b/**`     |
/// | `/a/b`     | `/a/b/**`     |
#[must_use]
pub fn normalize_pattern(pattern: &str) -> String {
    if pattern.ends_with("/**") {
        pattern.to_string()
    } else if pattern.ends_with("/*") {
        format!("{pattern}*")
    } else if pattern.ends_with('/') {
        format!("{pattern}**")
    } else {
        format!("{pattern}/**")
    }
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone)]
enum Segment {
    /// `**`: zero or more whole segments.
    Globstar,
    /// Plain text, compared verbatim.
    Literal(String),
    /// Wildcards confined to a single segment.
    Glob(Pattern),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "**" {
            return Self::Globstar;
        }
        if !raw.contains(['*', '?', '[']) {
            return Self::Literal(raw.to_string());
        }
        // Malformed glob syntax is compared literally.
        match Pattern::new(raw) {
            Ok(pattern) => Self::Glob(pattern),
            Err(_) => Self::Literal(raw.to_string()),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Globstar => true,
            Self::Literal(text) => text == segment,
            Self::Glob(pattern) => pattern.matches_with(segment, MATCH_OPTIONS),
        }
    }
}

/// A compiled path pattern.
///
/// Patterns without any `/` are matched against the final segment of the
/// candidate (base-name matching), so `*.proto` matches `/a/b/c.proto`.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    segments: Vec<Segment>,
    base_name: bool,
}

impl PathMatcher {
    /// Compiles `pattern` exactly as written.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            segments: pattern.split('/').map(Segment::parse).collect(),
            base_name: !pattern.contains('/'),
        }
    }

    /// Compiles the subtree-normalized form of `pattern`.
    ///
    /// See [`normalize_pattern`].
    #[must_use]
    pub fn subtree(pattern: &str) -> Self {
        Self::new(&normalize_pattern(pattern))
    }

    /// The pattern this matcher was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns whether `path` matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.base_name {
            let name = path.rsplit('/').next().unwrap_or(path);
            return match_segments(&self.segments, &[name]);
        }
        let parts: Vec<&str> = path.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Globstar, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}
