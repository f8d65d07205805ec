//! Named, typed accessors over `SearchResult`
//!
//! Sorting, field predicates and output projection all go through this table,
//! so an unknown field name is rejected once, when it is parsed.

use crate::error::FormatError;
use crate::types::SearchResult;
use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A field of `SearchResult` (or of its commit) addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultField {
    CommitHash,
    FilePath,
    LineNumber,
    MatchingLine,
    SearchType,
    RelevanceScore,
    AuthorName,
    AuthorEmail,
    /// Commit timestamp
    Date,
    CommitMessage,
}

impl ResultField {
    /// Canonical order, also the CSV column order
    pub const ALL: [ResultField; 10] = [
        ResultField::CommitHash,
        ResultField::FilePath,
        ResultField::LineNumber,
        ResultField::MatchingLine,
        ResultField::SearchType,
        ResultField::RelevanceScore,
        ResultField::AuthorName,
        ResultField::AuthorEmail,
        ResultField::Date,
        ResultField::CommitMessage,
    ];

    /// Canonical name, used as JSON key and CSV header
    pub fn name(&self) -> &'static str {
        match self {
            ResultField::CommitHash => "commit_hash",
            ResultField::FilePath => "file_path",
            ResultField::LineNumber => "line_number",
            ResultField::MatchingLine => "matching_line",
            ResultField::SearchType => "search_type",
            ResultField::RelevanceScore => "relevance_score",
            ResultField::AuthorName => "author_name",
            ResultField::AuthorEmail => "author_email",
            ResultField::Date => "commit_date",
            ResultField::CommitMessage => "commit_message",
        }
    }

    pub fn value(&self, result: &SearchResult) -> FieldValue {
        let commit = result.commit_info.as_ref();
        match self {
            ResultField::CommitHash => FieldValue::Text(result.commit_hash.clone()),
            ResultField::FilePath => FieldValue::Text(result.file_path.clone()),
            ResultField::LineNumber => result
                .line_number
                .map_or(FieldValue::Missing, |n| FieldValue::Int(n as i64)),
            ResultField::MatchingLine => result
                .matching_line
                .clone()
                .map_or(FieldValue::Missing, FieldValue::Text),
            ResultField::SearchType => FieldValue::Text(result.search_type.as_str().to_string()),
            ResultField::RelevanceScore => FieldValue::Float(result.relevance_score),
            ResultField::AuthorName => commit
                .map_or(FieldValue::Missing, |c| FieldValue::Text(c.author_name.clone())),
            ResultField::AuthorEmail => commit
                .map_or(FieldValue::Missing, |c| FieldValue::Text(c.author_email.clone())),
            ResultField::Date => commit.map_or(FieldValue::Missing, |c| FieldValue::Timestamp(c.timestamp)),
            ResultField::CommitMessage => commit
                .map_or(FieldValue::Missing, |c| FieldValue::Text(c.message.clone())),
        }
    }
}

impl fmt::Display for ResultField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResultField {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_ascii_lowercase().as_str() {
            "commit_hash" | "hash" | "commit" => ResultField::CommitHash,
            "file_path" | "path" | "file" => ResultField::FilePath,
            "line_number" | "line" => ResultField::LineNumber,
            "matching_line" => ResultField::MatchingLine,
            "search_type" | "type" => ResultField::SearchType,
            "relevance_score" | "relevance" | "score" => ResultField::RelevanceScore,
            "author_name" | "author" => ResultField::AuthorName,
            "author_email" | "email" => ResultField::AuthorEmail,
            "commit_date" | "date" | "timestamp" => ResultField::Date,
            "commit_message" | "message" => ResultField::CommitMessage,
            _ => return Err(FormatError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

impl Serialize for ResultField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ResultField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A field value with a total order
///
/// Missing values sort before numbers, numbers before text.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Missing,
    Int(i64),
    Float(f64),
    /// Unix epoch seconds, rendered as RFC 3339
    Timestamp(i64),
    Text(String),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Missing => 0,
            FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Timestamp(_) => 1,
            FieldValue::Text(_) => 2,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) | FieldValue::Timestamp(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Text form; missing values render as an empty string
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Timestamp(ts) => DateTime::from_timestamp(*ts, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| ts.to_string()),
            FieldValue::Text(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Missing => serde_json::Value::Null,
            FieldValue::Int(n) => serde_json::Value::from(*n),
            FieldValue::Float(f) => serde_json::Value::from(*f),
            FieldValue::Timestamp(_) | FieldValue::Text(_) => serde_json::Value::String(self.to_text()),
        }
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldValue {}
