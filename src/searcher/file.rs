use super::{CommitContext, CompiledQuery, Searcher};
use crate::error::SearcherError;
use crate::types::{SearchResult, SearchType, file_extension};

/// Matches changed file paths (new or old side) against `file_path_pattern`
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePathSearcher;

impl Searcher for FilePathSearcher {
    fn name(&self) -> &'static str {
        "file_path"
    }

    fn search_type(&self) -> SearchType {
        SearchType::FilePath
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.has_path_pattern()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        if !query.has_path_pattern() {
            return Ok(Vec::new());
        }

        Ok(ctx
            .changes
            .iter()
            .filter(|change| {
                query.matches_path(&change.path)
                    || change.old_path.as_deref().is_some_and(|p| query.matches_path(p))
            })
            .map(|change| SearchResult::new(ctx.info, change.path.as_str(), SearchType::FilePath, 1.0))
            .collect())
    }
}

/// Matches changed files whose extension is in `file_extensions`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTypeSearcher;

impl Searcher for FileTypeSearcher {
    fn name(&self) -> &'static str {
        "file_type"
    }

    fn search_type(&self) -> SearchType {
        SearchType::FileType
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        !query.extensions().is_empty()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let extensions = query.extensions();
        if extensions.is_empty() {
            return Ok(Vec::new());
        }

        Ok(ctx
            .changes
            .iter()
            .filter(|change| file_extension(&change.path).is_some_and(|ext| extensions.contains(&ext)))
            .map(|change| SearchResult::new(ctx.info, change.path.as_str(), SearchType::FileType, 1.0))
            .collect())
    }
}
