//! Glob pattern matching utilities for path filtering

use crate::error::ValidationError;
use globset::{Glob, GlobMatcher};

/// A set of compiled globs matched against repository-relative paths
///
/// A path matches when any glob matches the whole path, the path without a
/// leading slash, or any of its trailing component suffixes. The suffix rule
/// lets `lib/**` match `vendor/lib/x.rs`.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    matchers: Vec<GlobMatcher>,
}

impl PathMatcher {
    /// Compile all patterns, failing on the first invalid one
    pub fn new(patterns: &[String]) -> Result<Self, ValidationError> {
        let matchers = patterns
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// True if any glob matches; an empty matcher matches nothing
    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| matcher_matches(m, path))
    }

    /// True if the path passes this matcher used as an include list;
    /// an empty matcher allows everything
    pub fn allows(&self, path: &str) -> bool {
        self.is_empty() || self.matches(path)
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher, ValidationError> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| ValidationError::InvalidGlob {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn matcher_matches(matcher: &GlobMatcher, path: &str) -> bool {
    if matcher.is_match(path) {
        return true;
    }

    let trimmed = path.trim_start_matches('/');
    if matcher.is_match(trimmed) {
        return true;
    }

    trimmed
        .match_indices('/')
        .any(|(idx, _)| matcher.is_match(&trimmed[idx + 1..]))
}

/// Check if a path matches any of the given patterns, leniently
///
/// Each pattern is tried as a glob and as a path prefix. Patterns that are not
/// valid globs fall back to substring matching. No patterns means match
/// everything.
///
/// # Examples
///
/// ```
/// use githound::glob_utils::matches_any_pattern;
///
/// let patterns = vec!["src/**/*.rs".to_string(), "docs/".to_string()];
/// assert!(matches_any_pattern("src/git/walker.rs", &patterns));
/// assert!(matches_any_pattern("docs/guide.md", &patterns));
/// assert!(!matches_any_pattern("tests/search.py", &patterns));
/// ```
pub fn matches_any_pattern(path: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }

    patterns.iter().any(|pattern| {
        if path.starts_with(pattern.as_str()) {
            return true;
        }
        match compile(pattern) {
            Ok(matcher) => matcher_matches(&matcher, path),
            Err(e) => {
                tracing::warn!("{}, falling back to substring match", e);
                path.contains(pattern.as_str())
            }
        }
    })
}
