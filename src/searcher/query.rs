//! Pre-compiled form of a `SearchQuery`

use crate::error::ValidationError;
use crate::git::HistoryFilters;
use crate::glob_utils::PathMatcher;
use crate::types::{SearchQuery, normalize_extension};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// A validated query with its regexes and globs compiled once per search
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    query: SearchQuery,
    content: Option<Regex>,
    author: Option<Regex>,
    message: Option<Regex>,
    path_glob: PathMatcher,
    path_regex: Option<Regex>,
    commit_prefix: Option<String>,
    extensions: HashSet<String>,
    include: PathMatcher,
    exclude: PathMatcher,
}

impl CompiledQuery {
    /// Validate and compile `query`
    ///
    /// Fails on an out-of-range fuzzy threshold, an inverted date range, a
    /// non-hex commit hash, an invalid content regex or an invalid glob. An
    /// author or message pattern that is not a valid regex is matched literally.
    pub fn new(query: SearchQuery) -> Result<Self, ValidationError> {
        validate(&query)?;

        let case_sensitive = query.case_sensitive;

        let content = match (&query.content_pattern, query.fuzzy_search) {
            (Some(pattern), false) => Some(build_regex(pattern, case_sensitive)?),
            _ => None,
        };

        let author = query
            .author_pattern
            .as_deref()
            .map(|p| build_regex_or_literal(p, case_sensitive))
            .transpose()?;
        let message = query
            .message_pattern
            .as_deref()
            .map(|p| build_regex_or_literal(p, case_sensitive))
            .transpose()?;

        let (path_glob, path_regex) = match &query.file_path_pattern {
            Some(pattern) => {
                let regex = Regex::new(pattern).ok();
                match (PathMatcher::new(std::slice::from_ref(pattern)), regex) {
                    (Ok(glob), regex) => (glob, regex),
                    (Err(_), Some(regex)) => (PathMatcher::default(), Some(regex)),
                    (Err(e), None) => return Err(e),
                }
            }
            None => (PathMatcher::default(), None),
        };

        let commit_prefix = query
            .commit_hash
            .as_deref()
            .map(|h| h.trim().to_ascii_lowercase());

        let extensions = query
            .file_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();

        let include = PathMatcher::new(&query.include_globs)?;
        let exclude = PathMatcher::new(&query.exclude_globs)?;

        Ok(Self {
            query,
            content,
            author,
            message,
            path_glob,
            path_regex,
            commit_prefix,
            extensions,
            include,
            exclude,
        })
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn content_regex(&self) -> Option<&Regex> {
        self.content.as_ref()
    }

    pub fn author_regex(&self) -> Option<&Regex> {
        self.author.as_ref()
    }

    pub fn message_regex(&self) -> Option<&Regex> {
        self.message.as_ref()
    }

    pub fn commit_prefix(&self) -> Option<&str> {
        self.commit_prefix.as_deref()
    }

    /// Normalized extensions (lowercase, no dot)
    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    /// Plain-text pattern for approximate matching, when fuzzy mode is on
    pub fn fuzzy_pattern(&self) -> Option<&str> {
        if self.query.fuzzy_search {
            self.query.content_pattern.as_deref()
        } else {
            None
        }
    }

    /// Whether `path` matches `file_path_pattern` as a glob or a regex
    pub fn matches_path(&self, path: &str) -> bool {
        self.path_glob.matches(path) || self.path_regex.as_ref().is_some_and(|re| re.is_match(path))
    }

    pub fn has_path_pattern(&self) -> bool {
        self.query.file_path_pattern.is_some()
    }

    /// Whether include/exclude globs let `path` be searched
    pub fn allows_file(&self, path: &str) -> bool {
        self.include.allows(path) && !self.exclude.matches(path)
    }

    /// Blob size limit in bytes, falling back to `default`
    pub fn max_file_size(&self, default: u64) -> u64 {
        self.query.max_file_size.unwrap_or(default)
    }

    /// Whether a commit whose changed blobs total `size` bytes passes the size bounds
    pub fn accepts_commit_size(&self, size: u64) -> bool {
        self.query.min_commit_size.is_none_or(|min| size >= min)
            && self.query.max_commit_size.is_none_or(|max| size <= max)
    }

    pub fn has_commit_size_bounds(&self) -> bool {
        self.query.min_commit_size.is_some() || self.query.max_commit_size.is_some()
    }

    /// Commit-level filters pushed down into the history walk
    pub fn history_filters(&self, max_count: Option<usize>) -> HistoryFilters {
        let mut filters = HistoryFilters::default()
            .with_date_range(self.query.date_from, self.query.date_to)
            .with_max_count(max_count);

        if let Some(author) = &self.author {
            filters = filters.with_author(author.clone());
        }
        if let Some(message) = &self.message {
            filters = filters.with_message(message.clone());
        }
        if self.has_path_pattern() {
            filters = filters.with_paths(self.path_glob.clone());
            if let Some(regex) = &self.path_regex {
                filters = filters.with_path_regex(regex.clone());
            }
        }
        filters
    }
}

fn validate(query: &SearchQuery) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&query.fuzzy_threshold) {
        return Err(ValidationError::ConstraintViolation {
            field: "fuzzy_threshold".to_string(),
            constraint: "between 0.0 and 1.0".to_string(),
            actual: query.fuzzy_threshold.to_string(),
        });
    }

    if let (Some(from), Some(to)) = (query.date_from, query.date_to)
        && from > to
    {
        return Err(ValidationError::ConstraintViolation {
            field: "date_from".to_string(),
            constraint: format!("not after date_to ({})", to),
            actual: from.to_string(),
        });
    }

    if let (Some(min), Some(max)) = (query.min_commit_size, query.max_commit_size)
        && min > max
    {
        return Err(ValidationError::ConstraintViolation {
            field: "min_commit_size".to_string(),
            constraint: format!("not above max_commit_size ({})", max),
            actual: min.to_string(),
        });
    }

    if let Some(hash) = &query.commit_hash {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(ValidationError::Empty("commit_hash".to_string()));
        }
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidValue(
                "commit_hash".to_string(),
                hash.to_string(),
            ));
        }
    }

    for (field, value) in [
        ("content_pattern", &query.content_pattern),
        ("author_pattern", &query.author_pattern),
        ("message_pattern", &query.message_pattern),
        ("file_path_pattern", &query.file_path_pattern),
    ] {
        if value.as_deref().is_some_and(|v| v.is_empty()) {
            return Err(ValidationError::Empty(field.to_string()));
        }
    }

    Ok(())
}

fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, ValidationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| ValidationError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn build_regex_or_literal(pattern: &str, case_sensitive: bool) -> Result<Regex, ValidationError> {
    build_regex(pattern, case_sensitive).or_else(|e| {
        tracing::debug!("{}, matching literally", e);
        build_regex(&regex::escape(pattern), case_sensitive)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_content_regex_case_insensitive_by_default() {
        let compiled = CompiledQuery::new(SearchQuery::content("todo")).unwrap();
        let regex = compiled.content_regex().unwrap();
        assert!(regex.is_match("// TODO: fix"));
    }

    #[test]
    fn test_compile_content_regex_case_sensitive() {
        let compiled =
            CompiledQuery::new(SearchQuery::content("todo").case_sensitive(true)).unwrap();
        let regex = compiled.content_regex().unwrap();
        assert!(!regex.is_match("// TODO: fix"));
        assert!(regex.is_match("// todo: fix"));
    }

    #[test]
    fn test_invalid_content_regex_is_rejected() {
        let err = CompiledQuery::new(SearchQuery::content("(unclosed")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRegex { .. }));
    }

    #[test]
    fn test_fuzzy_mode_skips_regex_compilation() {
        let compiled = CompiledQuery::new(SearchQuery::content("(unclosed").fuzzy(0.5)).unwrap();
        assert!(compiled.content_regex().is_none());
        assert_eq!(compiled.fuzzy_pattern(), Some("(unclosed"));
    }

    #[test]
    fn test_invalid_author_regex_matches_literally() {
        let compiled = CompiledQuery::new(SearchQuery::author("bob (")).unwrap();
        let regex = compiled.author_regex().unwrap();
        assert!(regex.is_match("Bob (contractor)"));
        assert!(!regex.is_match("Bob"));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = CompiledQuery::new(SearchQuery::content("x").fuzzy(1.5)).unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_inverted_date_range() {
        let query = SearchQuery::default().with_date_range(Some(10), Some(5));
        assert!(CompiledQuery::new(query).is_err());
    }

    #[test]
    fn test_commit_hash_must_be_hex() {
        assert!(CompiledQuery::new(SearchQuery::commit("xyz")).is_err());
        let compiled = CompiledQuery::new(SearchQuery::commit(" ABC123 ")).unwrap();
        assert_eq!(compiled.commit_prefix(), Some("abc123"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = CompiledQuery::new(SearchQuery::message("")).unwrap_err();
        assert!(matches!(err, ValidationError::Empty(_)));
    }

    #[test]
    fn test_extensions_normalized() {
        let query = SearchQuery::default().with_extensions([".PY", "rs", ""]);
        let compiled = CompiledQuery::new(query).unwrap();
        let mut exts: Vec<_> = compiled.extensions().iter().cloned().collect();
        exts.sort();
        assert_eq!(exts, vec!["py", "rs"]);
    }

    #[test]
    fn test_path_matching_glob_or_regex() {
        let glob = CompiledQuery::new(SearchQuery::file_path("*.py")).unwrap();
        assert!(glob.matches_path("pkg/mod.py"));
        assert!(!glob.matches_path("pkg/mod.rs"));

        let regex = CompiledQuery::new(SearchQuery::file_path(r"^src/.*\.rs$")).unwrap();
        assert!(regex.matches_path("src/git/walker.rs"));
        assert!(!regex.matches_path("tests/walker.rs"));
    }

    #[test]
    fn test_include_exclude_globs() {
        let query = SearchQuery::content("x").with_globs(
            vec!["src/**".to_string()],
            vec!["**/generated/**".to_string()],
        );
        let compiled = CompiledQuery::new(query).unwrap();
        assert!(compiled.allows_file("src/lib.rs"));
        assert!(!compiled.allows_file("docs/readme.md"));
        assert!(!compiled.allows_file("src/generated/api.rs"));
    }

    #[test]
    fn test_commit_size_bounds() {
        let mut query = SearchQuery::content("x");
        query.min_commit_size = Some(10);
        query.max_commit_size = Some(100);
        let compiled = CompiledQuery::new(query).unwrap();

        assert!(compiled.has_commit_size_bounds());
        assert!(!compiled.accepts_commit_size(9));
        assert!(compiled.accepts_commit_size(10));
        assert!(compiled.accepts_commit_size(100));
        assert!(!compiled.accepts_commit_size(101));
    }

    #[test]
    fn test_history_filters_pushdown() {
        let query = SearchQuery::author("alice")
            .with_message("fix")
            .with_date_range(Some(1), Some(2));
        let filters = CompiledQuery::new(query).unwrap().history_filters(Some(5));

        assert!(filters.author.is_some());
        assert!(filters.message.is_some());
        assert_eq!(filters.since, Some(1));
        assert_eq!(filters.until, Some(2));
        assert_eq!(filters.max_count, Some(5));
        assert!(filters.paths.is_empty());
    }
}
