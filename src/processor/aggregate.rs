//! Grouping and summary statistics over result collections

use crate::error::ValidationError;
use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

const UNKNOWN: &str = "unknown";

/// Grouping key applied by `aggregate_results`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    ByCommit,
    ByFile,
    ByAuthor,
    /// Calendar day (UTC) of the commit
    ByDate,
}

impl AggregationStrategy {
    pub fn key(&self, result: &SearchResult) -> String {
        match self {
            AggregationStrategy::ByCommit => result.commit_hash.clone(),
            AggregationStrategy::ByFile => result.file_path.clone(),
            AggregationStrategy::ByAuthor => result
                .author_name()
                .map_or_else(|| UNKNOWN.to_string(), str::to_string),
            AggregationStrategy::ByDate => result
                .commit_info
                .as_ref()
                .map_or_else(|| UNKNOWN.to_string(), |c| c.day()),
        }
    }
}

impl FromStr for AggregationStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "commit" | "by_commit" => Ok(AggregationStrategy::ByCommit),
            "file" | "by_file" => Ok(AggregationStrategy::ByFile),
            "author" | "by_author" => Ok(AggregationStrategy::ByAuthor),
            "date" | "by_date" => Ok(AggregationStrategy::ByDate),
            _ => Err(ValidationError::InvalidValue(
                "aggregation strategy".to_string(),
                s.to_string(),
            )),
        }
    }
}

/// Partition `results` by the strategy's key; input order is kept within a group
pub fn aggregate_results(
    results: &[SearchResult],
    strategy: AggregationStrategy,
) -> BTreeMap<String, Vec<SearchResult>> {
    let mut groups: BTreeMap<String, Vec<SearchResult>> = BTreeMap::new();
    for result in results {
        groups
            .entry(strategy.key(result))
            .or_default()
            .push(result.clone());
    }
    groups
}

/// Size statistics of an aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationStats {
    pub total_groups: usize,
    pub total_results: usize,
    pub average_group_size: f64,
    pub largest_group_size: usize,
}

pub fn calculate_aggregation_stats(aggregated: &BTreeMap<String, Vec<SearchResult>>) -> AggregationStats {
    let total_groups = aggregated.len();
    let total_results: usize = aggregated.values().map(Vec::len).sum();
    let largest_group_size = aggregated.values().map(Vec::len).max().unwrap_or(0);
    let average_group_size = if total_groups == 0 {
        0.0
    } else {
        total_results as f64 / total_groups as f64
    };

    AggregationStats {
        total_groups,
        total_results,
        average_group_size,
        largest_group_size,
    }
}

/// Overview of a result collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_results: usize,
    /// Result count per search type name
    pub by_search_type: BTreeMap<String, usize>,
    pub unique_commits: usize,
    /// Distinct non-empty file paths
    pub unique_files: usize,
    pub unique_authors: usize,
    pub average_relevance: f64,
}

pub(crate) fn summarize(results: &[SearchResult]) -> ResultSummary {
    let mut by_search_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut commits = HashSet::new();
    let mut files = HashSet::new();
    let mut authors = HashSet::new();
    let mut relevance = 0.0;

    for result in results {
        *by_search_type
            .entry(result.search_type.as_str().to_string())
            .or_default() += 1;
        commits.insert(result.commit_hash.as_str());
        if !result.file_path.is_empty() {
            files.insert(result.file_path.as_str());
        }
        if let Some(author) = result.author_name() {
            authors.insert(author);
        }
        relevance += result.relevance_score;
    }

    ResultSummary {
        total_results: results.len(),
        by_search_type,
        unique_commits: commits.len(),
        unique_files: files.len(),
        unique_authors: authors.len(),
        average_relevance: if results.is_empty() {
            0.0
        } else {
            relevance / results.len() as f64
        },
    }
}
