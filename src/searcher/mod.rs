//! Search strategies, one per search dimension
//!
//! Each searcher looks at a single commit and returns zero or more results.
//! Searchers are stateless with respect to a search, so one registry can serve
//! concurrent searches.

/// Commit-level searchers: hash, author, message, date range
pub mod commit;
/// Regex and fuzzy searchers over changed file content
pub mod content;
/// Changed-path searchers: path pattern and file type
pub mod file;
/// Query validation and compilation
pub mod query;
/// String similarity metrics for fuzzy matching
pub mod similarity;

pub use commit::{AuthorSearcher, CommitHashSearcher, DateRangeSearcher, MessageSearcher};
pub use content::{ContentSearcher, DEFAULT_CONTEXT_LINES, FuzzySearcher};
pub use file::{FilePathSearcher, FileTypeSearcher};
pub use query::CompiledQuery;
pub use similarity::{JaroWinkler, LevenshteinRatio, PartialRatio, SimilarityMetric};

use crate::error::SearcherError;
use crate::git::FileChange;
use crate::types::{CommitInfo, SearchResult, SearchType};

/// Decoded text of one changed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub content: String,
}

/// Everything a searcher may look at for one commit
///
/// `changes` lists the changed paths that passed the include/exclude globs.
/// `files` holds decoded text for those that could be read; it is empty for
/// root commits and when no registered searcher needs content.
#[derive(Debug, Clone, Copy)]
pub struct CommitContext<'a> {
    pub info: &'a CommitInfo,
    pub changes: &'a [FileChange],
    pub files: &'a [ChangedFile],
}

/// A search strategy for one dimension of a query
pub trait Searcher: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn search_type(&self) -> SearchType;

    /// Whether the query sets the field this searcher cares about
    fn is_applicable(&self, query: &CompiledQuery) -> bool;

    /// Whether `search` reads `CommitContext::files`
    fn needs_content(&self) -> bool {
        false
    }

    /// Produce results for one commit
    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError>;
}

/// All built-in searchers in their canonical registration order
///
/// `context_lines` is passed to the `ContentSearcher`.
pub fn default_searchers(context_lines: usize) -> Vec<Box<dyn Searcher>> {
    vec![
        Box::new(CommitHashSearcher),
        Box::new(AuthorSearcher),
        Box::new(MessageSearcher),
        Box::new(DateRangeSearcher),
        Box::new(FilePathSearcher),
        Box::new(FileTypeSearcher),
        Box::new(ContentSearcher::new(context_lines)),
        Box::new(FuzzySearcher::default()),
    ]
}
