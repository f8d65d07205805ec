//! Search orchestration: drives the commit stream and dispatches searchers
//!
//! A [`SearchOrchestrator`] owns an ordered registry of searchers. Each call to
//! [`SearchOrchestrator::search`] validates the query, resolves the branch and
//! returns a lazy [`SearchStream`]; nothing is searched until results are pulled.
//! Cancellation tokens, progress reporting and metrics belong to one search, so
//! a single orchestrator can serve concurrent searches.

/// Per-search cancellation handle
pub mod cancel;
/// Bounded async channel surface over a search
pub mod channel;
/// Throttled progress callbacks
pub mod progress;
/// The pull-driven result stream
pub mod stream;

pub use cancel::{CancellationToken, TIMEOUT_REASON};
pub use channel::{ResultReceiver, SearchSummary};
pub use progress::ProgressCallback;
pub use stream::{SearchState, SearchStream};

use crate::config::SearchConfig;
use crate::error::HoundError;
use crate::git::{GitRepository, walk_history};
use crate::searcher::{CompiledQuery, Searcher, default_searchers};
use crate::types::{SearchQuery, default_fuzzy_threshold};
use progress::ProgressReporter;
use std::time::Duration;
use stream::StreamSettings;

/// Per-invocation options of a search
#[derive(Clone, Default)]
pub struct SearchOptions {
    /// Branch, tag or revision to start from (HEAD when `None`)
    pub branch: Option<String>,
    /// Stop after this many results
    pub max_results: Option<usize>,
    /// Walk at most this many commits that pass the pushdown filters
    pub max_commits: Option<usize>,
    /// Cancel the search once it has run this long
    pub timeout: Option<Duration>,
    /// Token the caller keeps to cancel the search
    pub cancellation: Option<CancellationToken>,
    pub progress: Option<ProgressCallback>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = Some(max_commits);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        self.progress = Some(std::sync::Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOptions")
            .field("branch", &self.branch)
            .field("max_results", &self.max_results)
            .field("max_commits", &self.max_commits)
            .field("timeout", &self.timeout)
            .field("cancellation", &self.cancellation)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Ordered registry of searchers plus the search settings they run under
pub struct SearchOrchestrator {
    searchers: Vec<Box<dyn Searcher>>,
    config: SearchConfig,
}

impl SearchOrchestrator {
    /// An orchestrator with an empty registry
    pub fn new(config: SearchConfig) -> Self {
        Self {
            searchers: Vec::new(),
            config,
        }
    }

    /// An orchestrator with every built-in searcher registered
    pub fn with_default_searchers(config: SearchConfig) -> Self {
        let searchers = default_searchers(config.context_lines);
        Self { searchers, config }
    }

    /// Append a searcher; results within a commit follow registration order
    pub fn register_searcher(&mut self, searcher: Box<dyn Searcher>) {
        tracing::debug!("Registered searcher: {}", searcher.name());
        self.searchers.push(searcher);
    }

    pub fn searchers(&self) -> &[Box<dyn Searcher>] {
        &self.searchers
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Start a search over `repo`
    ///
    /// Query validation and branch resolution happen here, so an invalid
    /// pattern, an unknown branch or an empty repository is reported before
    /// any result is produced. A fuzzy query still carrying the built-in
    /// threshold runs with `search.fuzzy_threshold` from the config.
    pub fn search<'a>(
        &'a self,
        repo: &'a GitRepository,
        mut query: SearchQuery,
        options: SearchOptions,
    ) -> Result<SearchStream<'a>, HoundError> {
        if !query.has_criteria() {
            tracing::warn!("Search query sets no criteria; no searcher will produce results");
        }
        if query.fuzzy_search && query.fuzzy_threshold == default_fuzzy_threshold() {
            query.fuzzy_threshold = self.config.fuzzy_threshold;
        }
        let query = CompiledQuery::new(query)?;

        let branch = options.branch.as_deref();
        let commits = walk_history(repo, branch, query.history_filters(options.max_commits))?;

        let mut progress = ProgressReporter::new(options.progress, self.config.progress_interval);
        if progress.is_enabled() {
            let total = match options.max_commits {
                Some(max) => max,
                None => repo.estimate_commit_count(repo.resolve_branch(branch)?)?,
            };
            progress.set_total(total);
        }

        tracing::info!(
            "Starting search in {} (branch: {}, max_results: {:?})",
            repo.repo_path().display(),
            branch.unwrap_or("HEAD"),
            options.max_results
        );

        let settings = StreamSettings {
            max_results: options.max_results,
            timeout: options.timeout,
            cancellation: options.cancellation.unwrap_or_default(),
            max_file_size: self.config.max_file_size,
            parallel: self.config.parallel_searchers,
        };

        Ok(SearchStream::new(
            repo,
            commits,
            &self.searchers,
            query,
            settings,
            progress,
        ))
    }
}

impl Default for SearchOrchestrator {
    fn default() -> Self {
        Self::with_default_searchers(SearchConfig::default())
    }
}
