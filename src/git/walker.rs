use super::diff::{FileChange, changed_files};
use super::repository::GitRepository;
use crate::error::RepositoryError;
use crate::glob_utils::PathMatcher;
use crate::types::CommitInfo;
use git2::{Revwalk, Sort};
use regex::Regex;

/// Coarse commit filters applied while walking history
#[derive(Debug, Clone, Default)]
pub struct HistoryFilters {
    /// Matched against author name or email
    pub author: Option<Regex>,
    /// Matched against the full commit message
    pub message: Option<Regex>,
    /// Inclusive lower bound on commit time (Unix epoch seconds)
    pub since: Option<i64>,
    /// Inclusive upper bound on commit time (Unix epoch seconds)
    pub until: Option<i64>,
    /// Commit must touch at least one path matching `paths` or `path_regex`
    /// (both empty = no restriction)
    pub paths: PathMatcher,
    pub path_regex: Option<Regex>,
    /// Stop after this many commits have passed the filters
    pub max_count: Option<usize>,
}

impl HistoryFilters {
    pub fn with_author(mut self, author: Regex) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_message(mut self, message: Regex) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_date_range(mut self, since: Option<i64>, until: Option<i64>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn with_paths(mut self, paths: PathMatcher) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_path_regex(mut self, path_regex: Regex) -> Self {
        self.path_regex = Some(path_regex);
        self
    }

    pub fn with_max_count(mut self, max_count: Option<usize>) -> Self {
        self.max_count = max_count;
        self
    }

    fn accepts_metadata(&self, info: &CommitInfo) -> bool {
        if let Some(since) = self.since
            && info.timestamp < since
        {
            return false;
        }
        if let Some(until) = self.until
            && info.timestamp > until
        {
            return false;
        }
        if let Some(author) = &self.author
            && !author.is_match(&info.author_name)
            && !author.is_match(&info.author_email)
        {
            return false;
        }
        if let Some(message) = &self.message
            && !message.is_match(&info.message)
        {
            return false;
        }
        true
    }

    fn accepts_path(&self, path: &str) -> bool {
        self.paths.matches(path) || self.path_regex.as_ref().is_some_and(|re| re.is_match(path))
    }

    fn accepts_changes(&self, changes: &[FileChange]) -> bool {
        if self.paths.is_empty() && self.path_regex.is_none() {
            return true;
        }
        changes.iter().any(|c| {
            self.accepts_path(&c.path) || c.old_path.as_deref().is_some_and(|p| self.accepts_path(p))
        })
    }
}

/// A commit pulled from history, with the files it changed
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub info: CommitInfo,
    pub changes: Vec<FileChange>,
}

/// Returns `true` when the walk should end early
pub type Interrupt<'repo> = Box<dyn Fn() -> bool + 'repo>;

/// Lazy newest-first sequence of commits that pass the filters
///
/// Each call to `next` reads at most as many commits from the object database
/// as needed to find the next accepted one. A commit whose objects cannot be
/// read is logged and skipped; only a broken revwalk ends the stream with an
/// error.
pub struct CommitStream<'repo> {
    repo: &'repo GitRepository,
    revwalk: Revwalk<'repo>,
    filters: HistoryFilters,
    interrupt: Option<Interrupt<'repo>>,
    yielded: usize,
    walked: usize,
    skipped: usize,
    interrupted: bool,
    finished: bool,
}

impl<'repo> CommitStream<'repo> {
    /// Commits read from the revwalk so far, accepted or not
    pub fn commits_walked(&self) -> usize {
        self.walked
    }

    /// Commits yielded so far
    pub fn commits_yielded(&self) -> usize {
        self.yielded
    }

    /// Commits dropped because their objects could not be read
    pub fn commits_skipped(&self) -> usize {
        self.skipped
    }

    /// Whether the walk ended because the interrupt fired
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Consult `interrupt` before reading each commit, including commits the
    /// filters reject
    pub fn with_interrupt(mut self, interrupt: impl Fn() -> bool + 'repo) -> Self {
        self.interrupt = Some(Box::new(interrupt));
        self
    }

    fn skip(&mut self, oid: git2::Oid, what: &str, err: &dyn std::fmt::Display) {
        tracing::warn!("Skipping commit {}: failed to read {}: {}", oid, what, err);
        self.skipped += 1;
    }

    fn next_entry(&mut self) -> Result<Option<HistoryEntry>, RepositoryError> {
        loop {
            if self.filters.max_count.is_some_and(|max| self.yielded >= max) {
                return Ok(None);
            }
            if self.interrupt.as_ref().is_some_and(|stop| stop()) {
                tracing::debug!("History walk interrupted after {} commits", self.walked);
                self.interrupted = true;
                return Ok(None);
            }

            let Some(oid) = self.revwalk.next() else {
                return Ok(None);
            };
            let oid = oid.map_err(|e| RepositoryError::WalkFailed(e.to_string()))?;
            self.walked += 1;

            let commit = match self.repo.inner().find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => {
                    self.skip(oid, "commit", &e);
                    continue;
                }
            };
            let info = match self.repo.commit_info(&commit) {
                Ok(info) => info,
                Err(e) => {
                    self.skip(oid, "diff stats", &e);
                    continue;
                }
            };

            if !self.filters.accepts_metadata(&info) {
                continue;
            }

            let changes = match changed_files(self.repo, &commit) {
                Ok(changes) => changes,
                Err(e) => {
                    self.skip(oid, "changed files", &e);
                    continue;
                }
            };
            if !self.filters.accepts_changes(&changes) {
                tracing::debug!("Skipping commit {}: no changed path matches", info.short_hash);
                continue;
            }

            self.yielded += 1;
            if self.walked % 50 == 0 {
                tracing::debug!(
                    "Walked {} commits, accepted {}",
                    self.walked,
                    self.yielded
                );
            }

            return Ok(Some(HistoryEntry { info, changes }));
        }
    }
}

impl Iterator for CommitStream<'_> {
    type Item = Result<HistoryEntry, RepositoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Walk history from `branch` (HEAD when `None`), newest first
///
/// Resolving the starting point happens eagerly, so an unknown branch or an
/// empty repository is reported before any commit is produced.
pub fn walk_history<'repo>(
    repo: &'repo GitRepository,
    branch: Option<&str>,
    filters: HistoryFilters,
) -> Result<CommitStream<'repo>, RepositoryError> {
    let tip = repo.resolve_branch(branch)?;

    let mut revwalk = repo.inner().revwalk()?;
    revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
    revwalk.push(tip)?;

    tracing::debug!(
        "Walking history from {} ({})",
        branch.unwrap_or("HEAD"),
        tip
    );

    Ok(CommitStream {
        repo,
        revwalk,
        filters,
        interrupt: None,
        yielded: 0,
        walked: 0,
        skipped: 0,
        interrupted: false,
        finished: false,
    })
}
