//! Lazy, pull-driven result stream for one search

use super::cancel::CancellationToken;
use super::progress::ProgressReporter;
use crate::error::{RepositoryError, SearcherError};
use crate::git::{CommitStream, FileChange, GitRepository, HistoryEntry, diff, read_text};
use crate::searcher::{ChangedFile, CommitContext, CompiledQuery, Searcher};
use crate::types::{SearchMetrics, SearchResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

/// Lifecycle of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    /// Created, nothing pulled yet
    Idle,
    Running,
    /// History exhausted or `max_results` reached
    Completed,
    /// Stopped by a cancellation request or timeout
    Cancelled,
    /// Stopped by a repository error while walking history
    Failed,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchState::Completed | SearchState::Cancelled | SearchState::Failed
        )
    }
}

/// Knobs resolved by the orchestrator before the stream is built
pub(crate) struct StreamSettings {
    pub max_results: Option<usize>,
    pub timeout: Option<Duration>,
    pub cancellation: CancellationToken,
    pub max_file_size: u64,
    pub parallel: bool,
}

/// Iterator over the results of one search, in commit order
///
/// Each call to `next` processes at most one more commit. Results of a commit
/// are buffered only until they are pulled, and no commit is started once
/// `max_results` results have been produced or cancellation was requested.
pub struct SearchStream<'a> {
    repo: &'a GitRepository,
    commits: CommitStream<'a>,
    searchers: Vec<&'a dyn Searcher>,
    load_content: bool,
    query: CompiledQuery,
    settings: StreamSettings,
    progress: ProgressReporter,
    pending: VecDeque<SearchResult>,
    produced: usize,
    state: SearchState,
    metrics: SearchMetrics,
    failure: Option<RepositoryError>,
    started: Instant,
}

impl<'a> SearchStream<'a> {
    pub(crate) fn new(
        repo: &'a GitRepository,
        commits: CommitStream<'a>,
        registry: &'a [Box<dyn Searcher>],
        query: CompiledQuery,
        settings: StreamSettings,
        progress: ProgressReporter,
    ) -> Self {
        let searchers: Vec<&'a dyn Searcher> = registry
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| s.is_applicable(&query))
            .collect();
        let load_content = searchers.iter().any(|s| s.needs_content());

        tracing::debug!(
            "Active searchers: {:?}",
            searchers.iter().map(|s| s.name()).collect::<Vec<_>>()
        );

        // Commits rejected by the history filters never reach `next`, so the
        // walker has to watch the deadline and the token itself
        let started = Instant::now();
        let deadline = settings.timeout.map(|timeout| started + timeout);
        let token = settings.cancellation.clone();
        let commits = commits.with_interrupt(move || token.check_deadline(deadline));

        Self {
            repo,
            commits,
            searchers,
            load_content,
            query,
            settings,
            progress,
            pending: VecDeque::new(),
            produced: 0,
            state: SearchState::Idle,
            metrics: SearchMetrics::default(),
            failure: None,
            started,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// The repository error that ended the stream, when the state is `Failed`
    pub fn failure(&self) -> Option<&RepositoryError> {
        self.failure.as_ref()
    }

    /// Cancellation handle for this search
    pub fn cancellation(&self) -> &CancellationToken {
        &self.settings.cancellation
    }

    /// Commits read from history so far, including ones rejected by pushdown filters
    pub fn commits_walked(&self) -> usize {
        self.commits.commits_walked()
    }

    /// Drain the stream into a vector
    pub fn collect_results(&mut self) -> Vec<SearchResult> {
        self.by_ref().collect()
    }

    fn cap_reached(&self) -> bool {
        self.settings.max_results.is_some_and(|max| self.produced >= max)
    }

    fn finish(&mut self, state: SearchState) {
        self.state = state;
        self.metrics.duration = self.started.elapsed();

        let summary = format!(
            "Search {:?}: {} commits, {} files, {} results in {:?}",
            state,
            self.metrics.commits_searched,
            self.metrics.files_searched,
            self.metrics.results_found,
            self.metrics.duration
        );
        match state {
            SearchState::Failed => tracing::warn!("{}", summary),
            _ => tracing::info!("{}", summary),
        }
        if state != SearchState::Failed {
            self.progress.finish(&summary);
        }
    }

    /// Whether the search must stop before starting another commit
    fn should_stop(&mut self) -> Option<SearchState> {
        if self.cap_reached() {
            return Some(SearchState::Completed);
        }
        let deadline = self.settings.timeout.map(|timeout| self.started + timeout);
        if self.settings.cancellation.check_deadline(deadline) {
            tracing::info!(
                "Search cancelled ({}) after {} commits",
                self.settings.cancellation.reason().unwrap_or("unspecified"),
                self.metrics.commits_searched
            );
            return Some(SearchState::Cancelled);
        }
        None
    }

    fn process_entry(&mut self, entry: HistoryEntry) {
        let HistoryEntry { info, changes } = entry;

        if self.query.has_commit_size_bounds() {
            let size = diff::total_size(self.repo, &changes);
            if !self.query.accepts_commit_size(size) {
                tracing::debug!("Skipping commit {}: size {} out of bounds", info.short_hash, size);
                self.metrics.commits_skipped += 1;
                return;
            }
        }

        let total_changes = changes.len();
        let changes: Vec<FileChange> = changes
            .into_iter()
            .filter(|c| self.query.allows_file(&c.path))
            .collect();
        self.metrics.files_skipped += total_changes - changes.len();
        self.metrics.commits_searched += 1;
        self.metrics.files_searched += changes.len();

        let files = if self.load_content {
            self.load_files(&changes)
        } else {
            Vec::new()
        };

        let ctx = CommitContext {
            info: &info,
            changes: &changes,
            files: &files,
        };
        let mut results = self.run_searchers(&ctx);

        if let Some(max) = self.settings.max_results {
            results.truncate(max.saturating_sub(self.produced));
        }
        self.produced += results.len();
        self.pending.extend(results);

        self.metrics.duration = self.started.elapsed();
        self.progress
            .tick(self.metrics.commits_searched, self.produced);
    }

    /// Decode the new side of every change that has a parent to diff against
    fn load_files(&mut self, changes: &[FileChange]) -> Vec<ChangedFile> {
        let mut files = Vec::with_capacity(changes.len());
        for change in changes {
            if !change.has_parent || change.is_deleted() {
                continue;
            }
            match read_text(self.repo, change, self.query.max_file_size(self.settings.max_file_size)) {
                Ok(content) => files.push(ChangedFile {
                    path: change.path.clone(),
                    content,
                }),
                Err(e) => {
                    tracing::debug!("Skipping file: {}", e);
                    self.metrics.files_skipped += 1;
                }
            }
        }
        files
    }

    /// Run every active searcher, keeping registration order in the output
    fn run_searchers(&mut self, ctx: &CommitContext<'_>) -> Vec<SearchResult> {
        let query = &self.query;
        let outcomes: Vec<(&str, Result<Vec<SearchResult>, SearcherError>)> = if self.settings.parallel
            && self.searchers.len() > 1
        {
            self.searchers
                .par_iter()
                .map(|s| (s.name(), run_searcher(*s, ctx, query)))
                .collect()
        } else {
            self.searchers
                .iter()
                .map(|s| (s.name(), run_searcher(*s, ctx, query)))
                .collect()
        };

        let mut results = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(found) => results.extend(found),
                Err(e) => {
                    tracing::warn!(
                        "Searcher {} failed on commit {}: {}",
                        name,
                        ctx.info.short_hash,
                        e
                    );
                    self.metrics.searcher_errors += 1;
                }
            }
        }
        results
    }
}

fn run_searcher(
    searcher: &dyn Searcher,
    ctx: &CommitContext<'_>,
    query: &CompiledQuery,
) -> Result<Vec<SearchResult>, SearcherError> {
    match catch_unwind(AssertUnwindSafe(|| searcher.search(ctx, query))) {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SearcherError::Panicked(format!("{}: {}", searcher.name(), message)))
        }
    }
}

impl Iterator for SearchStream<'_> {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                self.metrics.results_found += 1;
                return Some(result);
            }
            if self.state.is_terminal() {
                return None;
            }
            self.state = SearchState::Running;

            if let Some(state) = self.should_stop() {
                self.finish(state);
                return None;
            }

            let skipped_before = self.commits.commits_skipped();
            let next = self.commits.next();
            self.metrics.commits_skipped += self.commits.commits_skipped() - skipped_before;

            match next {
                None => {
                    let state = if self.commits.was_interrupted() {
                        self.should_stop().unwrap_or(SearchState::Cancelled)
                    } else {
                        SearchState::Completed
                    };
                    self.finish(state);
                    return None;
                }
                Some(Err(e)) => {
                    tracing::warn!("History walk failed: {}", e);
                    self.failure = Some(e);
                    self.finish(SearchState::Failed);
                    return None;
                }
                Some(Ok(entry)) => self.process_entry(entry),
            }
        }
    }
}
