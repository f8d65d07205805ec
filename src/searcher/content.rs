use super::similarity::{LevenshteinRatio, SimilarityMetric};
use super::{ChangedFile, CommitContext, CompiledQuery, Searcher};
use crate::error::SearcherError;
use crate::types::{MatchContext, SearchResult, SearchType};

/// Default number of lines captured around a content match
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Scans the text of changed files line by line with the content regex
///
/// Emits one result per matching line, carrying the 1-based line number, the
/// line itself and up to `context_lines` lines on either side.
#[derive(Debug, Clone, Copy)]
pub struct ContentSearcher {
    context_lines: usize,
}

impl ContentSearcher {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    fn context(&self, lines: &[&str], idx: usize) -> Option<MatchContext> {
        if self.context_lines == 0 {
            return None;
        }
        let start = idx.saturating_sub(self.context_lines);
        let end = (idx + 1 + self.context_lines).min(lines.len());
        Some(MatchContext {
            before: lines[start..idx].iter().map(|l| l.to_string()).collect(),
            after: lines[idx + 1..end].iter().map(|l| l.to_string()).collect(),
        })
    }
}

impl Default for ContentSearcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LINES)
    }
}

impl Searcher for ContentSearcher {
    fn name(&self) -> &'static str {
        "content"
    }

    fn search_type(&self) -> SearchType {
        SearchType::Content
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.content_regex().is_some()
    }

    fn needs_content(&self) -> bool {
        true
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let Some(regex) = query.content_regex() else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for ChangedFile { path, content } in ctx.files {
            let lines: Vec<&str> = content.lines().collect();
            for (idx, line) in lines.iter().enumerate() {
                if !regex.is_match(line) {
                    continue;
                }
                let mut result = SearchResult::new(ctx.info, path.as_str(), SearchType::Content, 1.0)
                    .with_line(idx + 1, *line);
                if let Some(context) = self.context(&lines, idx) {
                    result = result.with_context(context);
                }
                results.push(result);
            }
        }
        Ok(results)
    }
}

/// Approximate line matching of `content_pattern` when fuzzy search is on
///
/// Every non-blank line of every changed file is compared (trimmed) with the
/// pattern; lines scoring at least `fuzzy_threshold` are emitted with the
/// similarity as their relevance score.
pub struct FuzzySearcher {
    metric: Box<dyn SimilarityMetric>,
}

impl FuzzySearcher {
    pub fn new(metric: Box<dyn SimilarityMetric>) -> Self {
        Self { metric }
    }

    pub fn metric_name(&self) -> &'static str {
        self.metric.name()
    }
}

impl Default for FuzzySearcher {
    fn default() -> Self {
        Self::new(Box::new(LevenshteinRatio))
    }
}

impl std::fmt::Debug for FuzzySearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzySearcher")
            .field("metric", &self.metric.name())
            .finish()
    }
}

impl Searcher for FuzzySearcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn search_type(&self) -> SearchType {
        SearchType::Fuzzy
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.fuzzy_pattern().is_some()
    }

    fn needs_content(&self) -> bool {
        true
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let Some(pattern) = query.fuzzy_pattern() else {
            return Ok(Vec::new());
        };
        let case_sensitive = query.query().case_sensitive;
        let threshold = query.query().fuzzy_threshold;
        let pattern = if case_sensitive {
            pattern.trim().to_string()
        } else {
            pattern.trim().to_lowercase()
        };

        let mut results = Vec::new();
        for ChangedFile { path, content } in ctx.files {
            for (idx, line) in content.lines().enumerate() {
                let candidate = line.trim();
                if candidate.is_empty() {
                    continue;
                }
                let score = if case_sensitive {
                    self.metric.similarity(&pattern, candidate)
                } else {
                    self.metric.similarity(&pattern, &candidate.to_lowercase())
                };
                if !score.is_finite() {
                    return Err(SearcherError::Failed {
                        searcher: self.name().to_string(),
                        commit: ctx.info.short_hash.clone(),
                        reason: format!("{} returned {}", self.metric.name(), score),
                    });
                }
                if score >= threshold {
                    results.push(
                        SearchResult::new(ctx.info, path.as_str(), SearchType::Fuzzy, score)
                            .with_line(idx + 1, line),
                    );
                }
            }
        }
        Ok(results)
    }
}
