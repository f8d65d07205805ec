use crate::error::RepositoryError;
use crate::types::CommitInfo;
use git2::{BranchType, Commit, DiffOptions, ObjectType, Oid, Repository};
use std::path::{Path, PathBuf};

/// Read-only handle on a git repository
///
/// Wraps a `git2::Repository`. Nothing in this crate writes through it, so
/// independent searches may each open their own handle on the same path.
pub struct GitRepository {
    repo: Repository,
    repo_path: PathBuf,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("repo_path", &self.repo_path)
            .finish_non_exhaustive()
    }
}

impl GitRepository {
    /// Discover and open a git repository from any path within it
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RepositoryError::NotFound(path.display().to_string()));
        }

        let repo = Repository::discover(path)
            .map_err(|e| RepositoryError::NotFound(format!("{}: {}", path.display(), e)))?;

        Ok(Self::from_repository(repo))
    }

    /// Open the repository at exactly `path`, without searching parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|e| RepositoryError::OpenFailed(format!("{}: {}", path.display(), e)))?;

        Ok(Self::from_repository(repo))
    }

    fn from_repository(repo: Repository) -> Self {
        let repo_path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        tracing::info!("Opened git repository at: {}", repo_path.display());
        Self { repo, repo_path }
    }

    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub(crate) fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Get the current branch name, or None if detached HEAD
    pub fn current_branch(&self) -> Option<String> {
        self.repo.head().ok()?.shorthand().map(|s| s.to_string())
    }

    /// Check if repository has any commits
    pub fn has_commits(&self) -> bool {
        self.repo.head().is_ok()
    }

    /// Resolve a branch name (or HEAD when `None`) to the commit it points at
    ///
    /// Local branches are tried first, then remote-tracking branches, then any
    /// revision expression git understands (tags, hashes, `HEAD~2`).
    pub fn resolve_branch(&self, branch: Option<&str>) -> Result<Oid, RepositoryError> {
        let Some(name) = branch else {
            let head = self.repo.head().map_err(|_| RepositoryError::Empty)?;
            return head
                .peel_to_commit()
                .map(|c| c.id())
                .map_err(|_| RepositoryError::Empty);
        };

        for kind in [BranchType::Local, BranchType::Remote] {
            if let Ok(found) = self.repo.find_branch(name, kind) {
                return found
                    .get()
                    .peel_to_commit()
                    .map(|c| c.id())
                    .map_err(|_| RepositoryError::BranchNotFound(name.to_string()));
            }
        }

        self.repo
            .revparse_single(name)
            .and_then(|obj| obj.peel_to_commit())
            .map(|c| c.id())
            .map_err(|_| RepositoryError::BranchNotFound(name.to_string()))
    }

    /// Resolve a revision expression to commit metadata
    pub fn find_commit_info(&self, revision: &str) -> Result<CommitInfo, RepositoryError> {
        let commit = self
            .repo
            .revparse_single(revision)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| RepositoryError::RevisionNotFound(revision.to_string()))?;
        self.commit_info(&commit)
    }

    /// Count the commits reachable from `tip`
    pub fn estimate_commit_count(&self, tip: Oid) -> Result<usize, RepositoryError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(tip)?;
        Ok(revwalk.count())
    }

    /// Size in bytes of a blob, read from the object header only
    pub fn blob_size(&self, oid: Oid) -> Result<u64, RepositoryError> {
        let (size, kind) = self.repo.odb()?.read_header(oid)?;
        if kind != ObjectType::Blob {
            return Err(RepositoryError::Git(git2::Error::from_str(
                "object is not a blob",
            )));
        }
        Ok(size as u64)
    }

    /// Extract metadata and first-parent diff statistics from a commit
    pub(crate) fn commit_info(&self, commit: &Commit<'_>) -> Result<CommitInfo, RepositoryError> {
        let hash = commit.id().to_string();
        let author = commit.author();
        let committer = commit.committer();

        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        let stats = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))
            .and_then(|diff| diff.stats())
            .map_err(|e| RepositoryError::DiffFailed {
                commit: hash.clone(),
                reason: e.to_string(),
            })?;

        Ok(CommitInfo {
            short_hash: hash.chars().take(7).collect(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            committer_name: committer.name().unwrap_or("Unknown").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            timestamp: commit.time().seconds(),
            files_changed: stats.files_changed(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
            parent_hashes: commit.parent_ids().map(|id| id.to_string()).collect(),
            hash,
        })
    }
}
