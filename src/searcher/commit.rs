use super::{CommitContext, CompiledQuery, Searcher};
use crate::error::SearcherError;
use crate::types::{SearchResult, SearchType};

/// Matches a full commit hash or a hash prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitHashSearcher;

impl Searcher for CommitHashSearcher {
    fn name(&self) -> &'static str {
        "commit_hash"
    }

    fn search_type(&self) -> SearchType {
        SearchType::CommitHash
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.commit_prefix().is_some()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let Some(prefix) = query.commit_prefix() else {
            return Ok(Vec::new());
        };

        if ctx.info.hash.to_ascii_lowercase().starts_with(prefix) {
            Ok(vec![SearchResult::new(ctx.info, "", SearchType::CommitHash, 1.0)])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Matches the author pattern against author name or email
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorSearcher;

impl Searcher for AuthorSearcher {
    fn name(&self) -> &'static str {
        "author"
    }

    fn search_type(&self) -> SearchType {
        SearchType::Author
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.author_regex().is_some()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let Some(regex) = query.author_regex() else {
            return Ok(Vec::new());
        };

        let info = ctx.info;
        if regex.is_match(&info.author_name) || regex.is_match(&info.author_email) {
            let author = format!("{} <{}>", info.author_name, info.author_email);
            Ok(vec![
                SearchResult::new(info, "", SearchType::Author, 1.0).with_matching_text(author),
            ])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Matches the message pattern against the full commit message
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSearcher;

impl Searcher for MessageSearcher {
    fn name(&self) -> &'static str {
        "message"
    }

    fn search_type(&self) -> SearchType {
        SearchType::Message
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.message_regex().is_some()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let Some(regex) = query.message_regex() else {
            return Ok(Vec::new());
        };

        let message = &ctx.info.message;
        if !regex.is_match(message) {
            return Ok(Vec::new());
        }

        // Multi-line patterns may match across lines; fall back to the summary then.
        let line = message
            .lines()
            .find(|line| regex.is_match(line))
            .unwrap_or_else(|| ctx.info.summary());

        Ok(vec![
            SearchResult::new(ctx.info, "", SearchType::Message, 1.0)
                .with_matching_text(line.trim_end()),
        ])
    }
}

/// Matches commits whose timestamp lies within `[date_from, date_to]`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeSearcher;

impl Searcher for DateRangeSearcher {
    fn name(&self) -> &'static str {
        "date_range"
    }

    fn search_type(&self) -> SearchType {
        SearchType::DateRange
    }

    fn is_applicable(&self, query: &CompiledQuery) -> bool {
        query.query().has_date_range()
    }

    fn search(
        &self,
        ctx: &CommitContext<'_>,
        query: &CompiledQuery,
    ) -> Result<Vec<SearchResult>, SearcherError> {
        let q = query.query();
        let ts = ctx.info.timestamp;
        let after_start = q.date_from.is_none_or(|from| ts >= from);
        let before_end = q.date_to.is_none_or(|to| ts <= to);

        if q.has_date_range() && after_start && before_end {
            Ok(vec![SearchResult::new(ctx.info, "", SearchType::DateRange, 1.0)])
        } else {
            Ok(Vec::new())
        }
    }
}
