//! Post-processing of result collections
//!
//! [`ResultProcessor::process_results`] runs four stages in a fixed order:
//! deduplicate, filter, sort (stable, one field), truncate. Grouping and
//! summaries work on any collection, finished or partial.

/// Grouping and summary statistics
pub mod aggregate;
/// Named field accessors used for sorting, predicates and projection
pub mod fields;
/// Filter criteria and the test-file heuristic
pub mod filter;

pub use aggregate::{
    AggregationStats, AggregationStrategy, ResultSummary, aggregate_results,
    calculate_aggregation_stats,
};
pub use fields::{FieldValue, ResultField};
pub use filter::{FieldPredicate, FilterCriteria, PredicateOp, is_test_file};

use crate::error::ValidationError;
use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// What makes two results duplicates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// One result per commit
    #[default]
    CommitHash,
    /// One result per (commit, file)
    CommitAndFile,
    /// One result per (commit, file, line)
    CommitFileLine,
}

impl DedupKey {
    fn key(&self, result: &SearchResult) -> (String, String, Option<usize>) {
        match self {
            DedupKey::CommitHash => (result.commit_hash.clone(), String::new(), None),
            DedupKey::CommitAndFile => (result.commit_hash.clone(), result.file_path.clone(), None),
            DedupKey::CommitFileLine => (
                result.commit_hash.clone(),
                result.file_path.clone(),
                result.line_number,
            ),
        }
    }
}

impl FromStr for DedupKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit_hash" | "commit" => Ok(DedupKey::CommitHash),
            "commit_and_file" | "file" => Ok(DedupKey::CommitAndFile),
            "commit_file_line" | "line" => Ok(DedupKey::CommitFileLine),
            _ => Err(ValidationError::InvalidValue("dedup_key".to_string(), s.to_string())),
        }
    }
}

/// Which of several duplicates survives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// The first result encountered
    #[default]
    FirstSeen,
    /// The highest-scoring result, placed where the first duplicate was; ties keep the first
    HighestRelevance,
}

impl FromStr for DedupPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_seen" | "first" => Ok(DedupPolicy::FirstSeen),
            "highest_relevance" | "best" => Ok(DedupPolicy::HighestRelevance),
            _ => Err(ValidationError::InvalidValue("dedup_policy".to_string(), s.to_string())),
        }
    }
}

/// Processor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Drop duplicate results before filtering
    #[serde(default = "default_deduplicate")]
    pub deduplicate: bool,

    #[serde(default)]
    pub dedup_key: DedupKey,

    #[serde(default)]
    pub dedup_policy: DedupPolicy,
}

fn default_deduplicate() -> bool {
    true
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            deduplicate: default_deduplicate(),
            dedup_key: DedupKey::default(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(ValidationError::InvalidValue("sort_order".to_string(), s.to_string())),
        }
    }
}

/// Per-call options of `process_results`
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub filter: Option<FilterCriteria>,
    pub sort: Option<(ResultField, SortOrder)>,
    pub max_results: Option<usize>,
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sorted_by(mut self, field: ResultField, order: SortOrder) -> Self {
        self.sort = Some((field, order));
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// Deduplicates, filters, sorts, truncates and groups results
#[derive(Debug, Clone, Default)]
pub struct ResultProcessor {
    config: ProcessorConfig,
}

impl ResultProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run dedup, filter, sort and truncation over `results`
    pub fn process_results(&self, results: Vec<SearchResult>, options: &ProcessOptions) -> Vec<SearchResult> {
        let input = results.len();

        let mut results = if self.config.deduplicate {
            self.deduplicate(results)
        } else {
            results
        };

        if let Some(filter) = &options.filter {
            results.retain(|r| filter.matches(r));
        }

        if let Some((field, order)) = options.sort {
            sort_results(&mut results, field, order);
        }

        if let Some(max) = options.max_results {
            results.truncate(max);
        }

        tracing::debug!("Processed {} results into {}", input, results.len());
        results
    }

    /// Collapse results sharing a dedup key, keeping first-occurrence order
    pub fn deduplicate(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let key = self.config.dedup_key;
        let mut positions: HashMap<(String, String, Option<usize>), usize> = HashMap::new();
        let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());

        for result in results {
            match positions.get(&key.key(&result)) {
                None => {
                    positions.insert(key.key(&result), kept.len());
                    kept.push(result);
                }
                Some(&idx) => {
                    if self.config.dedup_policy == DedupPolicy::HighestRelevance
                        && result.relevance_score > kept[idx].relevance_score
                    {
                        kept[idx] = result;
                    }
                }
            }
        }
        kept
    }

    /// Group results; see [`aggregate_results`]
    pub fn aggregate_results(
        &self,
        results: &[SearchResult],
        strategy: AggregationStrategy,
    ) -> std::collections::BTreeMap<String, Vec<SearchResult>> {
        aggregate_results(results, strategy)
    }

    /// Counts by search type, distinct commits, files and authors, mean relevance
    pub fn summarize(&self, results: &[SearchResult]) -> ResultSummary {
        aggregate::summarize(results)
    }
}

/// Stable sort on one field
pub fn sort_results(results: &mut [SearchResult], field: ResultField, order: SortOrder) {
    results.sort_by(|a, b| {
        let ordering = field.value(a).cmp(&field.value(b));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests;
