//! Result filtering: AND-composed predicates over `SearchResult`

use super::fields::ResultField;
use crate::error::FormatError;
use crate::glob_utils::matches_any_pattern;
use crate::types::{SearchResult, SearchType, normalize_extension};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Path fragments that mark a file as test code, matched case-insensitively
///
/// Any occurrence counts, so `attestation.py` is treated as a test file too.
pub const TEST_PATH_MARKERS: [&str; 3] = ["test", "spec", "__test__"];

/// Whether `path` looks like test code
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    TEST_PATH_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// How a `FieldPredicate` compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOp {
    /// Exact match on the text form
    Equals,
    /// Case-insensitive substring of the text form
    Contains,
}

/// A comparison against one named field
///
/// Parses from `field=value` (equals) or `field~value` (contains).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPredicate {
    pub field: ResultField,
    pub op: PredicateOp,
    pub value: String,
}

impl FieldPredicate {
    pub fn equals(field: ResultField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: PredicateOp::Equals,
            value: value.into(),
        }
    }

    pub fn contains(field: ResultField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: PredicateOp::Contains,
            value: value.into(),
        }
    }

    pub fn matches(&self, result: &SearchResult) -> bool {
        let actual = self.field.value(result);
        if actual.is_missing() {
            return false;
        }
        let text = actual.to_text();
        match self.op {
            PredicateOp::Equals => text == self.value,
            PredicateOp::Contains => text.to_lowercase().contains(&self.value.to_lowercase()),
        }
    }
}

impl FromStr for FieldPredicate {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (idx, op) = s
            .char_indices()
            .find_map(|(i, c)| match c {
                '=' => Some((i, PredicateOp::Equals)),
                '~' => Some((i, PredicateOp::Contains)),
                _ => None,
            })
            .ok_or_else(|| FormatError::UnknownField(s.to_string()))?;

        Ok(Self {
            field: s[..idx].parse()?,
            op,
            value: s[idx + 1..].to_string(),
        })
    }
}

/// Conjunction of result predicates; unset criteria accept everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Results scoring below this are dropped
    #[serde(default)]
    pub min_relevance_score: Option<f64>,
    /// Extension allowlist (`"py"` or `".py"`)
    #[serde(default)]
    pub file_extensions: Vec<String>,
    /// Globs or path prefixes; a result must match one
    #[serde(default)]
    pub file_path_patterns: Vec<String>,
    /// Author names or emails, compared case-insensitively
    #[serde(default)]
    pub authors: Vec<String>,
    /// Inclusive lower bound on commit time (Unix epoch seconds)
    #[serde(default)]
    pub date_from: Option<i64>,
    /// Inclusive upper bound on commit time (Unix epoch seconds)
    #[serde(default)]
    pub date_to: Option<i64>,
    #[serde(default)]
    pub exclude_test_files: bool,
    #[serde(default)]
    pub search_types: Vec<SearchType>,
    #[serde(default)]
    pub field_predicates: Vec<FieldPredicate>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_relevance(mut self, score: f64) -> Self {
        self.min_relevance_score = Some(score);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_path_patterns(mut self, patterns: Vec<String>) -> Self {
        self.file_path_patterns = patterns;
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_date_range(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn excluding_test_files(mut self) -> Self {
        self.exclude_test_files = true;
        self
    }

    pub fn with_search_types(mut self, types: Vec<SearchType>) -> Self {
        self.search_types = types;
        self
    }

    pub fn with_predicate(mut self, predicate: FieldPredicate) -> Self {
        self.field_predicates.push(predicate);
        self
    }

    /// Whether `result` passes every set criterion
    pub fn matches(&self, result: &SearchResult) -> bool {
        if let Some(min) = self.min_relevance_score
            && result.relevance_score < min
        {
            return false;
        }

        if !self.file_extensions.is_empty() {
            let Some(ext) = result.extension() else {
                return false;
            };
            if !self
                .file_extensions
                .iter()
                .any(|allowed| normalize_extension(allowed) == ext)
            {
                return false;
            }
        }

        if !self.file_path_patterns.is_empty()
            && !matches_any_pattern(&result.file_path, &self.file_path_patterns)
        {
            return false;
        }

        if !self.authors.is_empty() {
            let Some(commit) = &result.commit_info else {
                return false;
            };
            let known = self.authors.iter().any(|a| {
                a.eq_ignore_ascii_case(&commit.author_name)
                    || a.eq_ignore_ascii_case(&commit.author_email)
            });
            if !known {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(ts) = result.timestamp() else {
                return false;
            };
            if self.date_from.is_some_and(|from| ts < from)
                || self.date_to.is_some_and(|to| ts > to)
            {
                return false;
            }
        }

        if self.exclude_test_files && is_test_file(&result.file_path) {
            return false;
        }

        if !self.search_types.is_empty() && !self.search_types.contains(&result.search_type) {
            return false;
        }

        self.field_predicates.iter().all(|p| p.matches(result))
    }
}
