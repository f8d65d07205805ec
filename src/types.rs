use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Search criteria for one history search
///
/// Every field is optional. Each searcher only activates when the field it
/// cares about is set, so the caller is expected to set at least one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchQuery {
    /// Regex matched against the lines of changed files (plain text in fuzzy mode)
    #[serde(default)]
    pub content_pattern: Option<String>,
    /// Full commit hash or unique prefix
    #[serde(default)]
    pub commit_hash: Option<String>,
    /// Substring or regex matched against author name and email
    #[serde(default)]
    pub author_pattern: Option<String>,
    /// Regex matched against the commit message
    #[serde(default)]
    pub message_pattern: Option<String>,
    /// Inclusive lower bound on commit time (Unix epoch seconds)
    #[serde(default)]
    pub date_from: Option<i64>,
    /// Inclusive upper bound on commit time (Unix epoch seconds)
    #[serde(default)]
    pub date_to: Option<i64>,
    /// Glob (or regex) matched against changed file paths
    #[serde(default)]
    pub file_path_pattern: Option<String>,
    /// File extensions to match (e.g., ["rs", ".py"])
    #[serde(default)]
    pub file_extensions: Vec<String>,
    /// Match case exactly in content, message and fuzzy comparisons
    #[serde(default)]
    pub case_sensitive: bool,
    /// Use approximate matching for `content_pattern` instead of a regex
    #[serde(default)]
    pub fuzzy_search: bool,
    /// Minimum similarity (0.0 to 1.0) for a fuzzy match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Only changed files matching one of these globs are searched
    #[serde(default)]
    pub include_globs: Vec<String>,
    /// Changed files matching one of these globs are never searched
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Blobs larger than this many bytes are skipped
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Commits whose changed blobs total fewer bytes are skipped
    #[serde(default)]
    pub min_commit_size: Option<u64>,
    /// Commits whose changed blobs total more bytes are skipped
    #[serde(default)]
    pub max_commit_size: Option<u64>,
}

pub(crate) fn default_fuzzy_threshold() -> f64 {
    0.8
}

/// JSON Schema of [`SearchQuery`], for clients that build queries as JSON
pub fn query_schema() -> schemars::Schema {
    schemars::schema_for!(SearchQuery)
}

/// JSON Schema of [`SearchResult`]
pub fn result_schema() -> schemars::Schema {
    schemars::schema_for!(SearchResult)
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            content_pattern: None,
            commit_hash: None,
            author_pattern: None,
            message_pattern: None,
            date_from: None,
            date_to: None,
            file_path_pattern: None,
            file_extensions: Vec::new(),
            case_sensitive: false,
            fuzzy_search: false,
            fuzzy_threshold: default_fuzzy_threshold(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            max_file_size: None,
            min_commit_size: None,
            max_commit_size: None,
        }
    }
}

impl SearchQuery {
    pub fn content(pattern: impl Into<String>) -> Self {
        Self {
            content_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn author(pattern: impl Into<String>) -> Self {
        Self {
            author_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn message(pattern: impl Into<String>) -> Self {
        Self {
            message_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn commit(hash: impl Into<String>) -> Self {
        Self {
            commit_hash: Some(hash.into()),
            ..Self::default()
        }
    }

    pub fn file_path(pattern: impl Into<String>) -> Self {
        Self {
            file_path_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, pattern: impl Into<String>) -> Self {
        self.author_pattern = Some(pattern.into());
        self
    }

    pub fn with_message(mut self, pattern: impl Into<String>) -> Self {
        self.message_pattern = Some(pattern.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.date_from = from;
        self.date_to = to;
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

    pub fn with_globs(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include_globs = include;
        self.exclude_globs = exclude;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Switch `content_pattern` to approximate matching with the given threshold
    pub fn fuzzy(mut self, threshold: f64) -> Self {
        self.fuzzy_search = true;
        self.fuzzy_threshold = threshold;
        self
    }

    /// True when at least one discriminating field is set
    pub fn has_criteria(&self) -> bool {
        self.content_pattern.is_some()
            || self.commit_hash.is_some()
            || self.author_pattern.is_some()
            || self.message_pattern.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.file_path_pattern.is_some()
            || !self.file_extensions.is_empty()
    }

    /// True when the query needs the text of changed blobs
    pub fn needs_content(&self) -> bool {
        self.content_pattern.is_some()
    }

    pub fn has_date_range(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }
}

/// Parse a date filter string (Unix timestamp, RFC 3339 or `YYYY-MM-DD`)
pub fn parse_date_filter(date_str: &str) -> Result<i64, ValidationError> {
    let date_str = date_str.trim();

    if let Ok(timestamp) = date_str.parse::<i64>() {
        return Ok(timestamp);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp());
    }

    if let Ok(day) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        && let Some(midnight) = day.and_hms_opt(0, 0, 0)
    {
        return Ok(Utc.from_utc_datetime(&midnight).timestamp());
    }

    Err(ValidationError::InvalidValue(
        "date".to_string(),
        date_str.to_string(),
    ))
}

/// The searcher that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    CommitHash,
    Author,
    Message,
    DateRange,
    FilePath,
    FileType,
    Content,
    Fuzzy,
}

impl SearchType {
    pub const ALL: [SearchType; 8] = [
        SearchType::CommitHash,
        SearchType::Author,
        SearchType::Message,
        SearchType::DateRange,
        SearchType::FilePath,
        SearchType::FileType,
        SearchType::Content,
        SearchType::Fuzzy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::CommitHash => "commit_hash",
            SearchType::Author => "author",
            SearchType::Message => "message",
            SearchType::DateRange => "date_range",
            SearchType::FilePath => "file_path",
            SearchType::FileType => "file_type",
            SearchType::Content => "content",
            SearchType::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SearchType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidValue("search_type".to_string(), s.to_string()))
    }
}

/// Metadata for one commit, extracted once from the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommitInfo {
    /// Full commit SHA hash (40 characters)
    pub hash: String,
    /// Abbreviated hash (first 7 characters)
    pub short_hash: String,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    /// Full commit message
    pub message: String,
    /// Commit timestamp (Unix epoch seconds)
    pub timestamp: i64,
    /// Number of files changed relative to the first parent
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    /// SHA hashes of parent commits
    pub parent_hashes: Vec<String>,
}

impl CommitInfo {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Calendar day of the commit (UTC) as `YYYY-MM-DD`
    pub fn day(&self) -> String {
        self.datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.parent_hashes.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() > 1
    }
}

/// Lines surrounding a content match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchContext {
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub after: Vec<String>,
}

/// A single match produced by one searcher for one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub commit_hash: String,
    /// Changed file the match refers to (empty for commit-level matches)
    pub file_path: String,
    /// 1-based line number within the file
    #[serde(default)]
    pub line_number: Option<usize>,
    #[serde(default)]
    pub matching_line: Option<String>,
    pub search_type: SearchType,
    /// Match quality (0.0 to 1.0)
    pub relevance_score: f64,
    #[serde(default)]
    pub commit_info: Option<CommitInfo>,
    #[serde(default)]
    pub match_context: Option<MatchContext>,
}

impl SearchResult {
    /// Create a result for `commit`; the score is clamped to [0, 1]
    pub fn new(
        commit: &CommitInfo,
        file_path: impl Into<String>,
        search_type: SearchType,
        relevance_score: f64,
    ) -> Self {
        Self {
            commit_hash: commit.hash.clone(),
            file_path: file_path.into(),
            line_number: None,
            matching_line: None,
            search_type,
            relevance_score: clamp_score(relevance_score),
            commit_info: Some(commit.clone()),
            match_context: None,
        }
    }

    pub fn with_line(mut self, line_number: usize, line: impl Into<String>) -> Self {
        self.line_number = Some(line_number);
        self.matching_line = Some(line.into());
        self
    }

    /// Record matched text that has no line number (author, message)
    pub fn with_matching_text(mut self, text: impl Into<String>) -> Self {
        self.matching_line = Some(text.into());
        self
    }

    pub fn with_context(mut self, context: MatchContext) -> Self {
        self.match_context = Some(context);
        self
    }

    pub fn author_name(&self) -> Option<&str> {
        self.commit_info.as_ref().map(|c| c.author_name.as_str())
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.commit_info.as_ref().map(|c| c.timestamp)
    }

    /// Lowercase extension of `file_path`, without the dot
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_path)
    }
}

/// Clamp a score into [0, 1], mapping NaN to 0
pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Lowercase extension of a path, without the dot
pub(crate) fn file_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Normalize a user-supplied extension (".PY" -> "py")
pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Counters for one search invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub commits_searched: usize,
    pub files_searched: usize,
    pub results_found: usize,
    /// Commits pulled from history but rejected by the commit size filter
    #[serde(default)]
    pub commits_skipped: usize,
    /// Files skipped because they were binary, too large or filtered by glob
    #[serde(default)]
    pub files_skipped: usize,
    /// Searcher invocations that failed and were skipped
    #[serde(default)]
    pub searcher_errors: usize,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests;
