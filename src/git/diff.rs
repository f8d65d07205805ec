//! Changed-file extraction and blob decoding

use super::repository::GitRepository;
use crate::error::{ContentDecodeError, RepositoryError};
use git2::{Commit, Delta, DiffOptions, Oid};
use std::collections::HashSet;

/// How a file changed relative to a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Other,
}

impl From<Delta> for ChangeStatus {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::Added => ChangeStatus::Added,
            Delta::Modified => ChangeStatus::Modified,
            Delta::Deleted => ChangeStatus::Deleted,
            Delta::Renamed => ChangeStatus::Renamed,
            Delta::Copied => ChangeStatus::Copied,
            _ => ChangeStatus::Other,
        }
    }
}

/// One file touched by a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path on the new side (old side for deletions)
    pub path: String,
    pub old_path: Option<String>,
    pub status: ChangeStatus,
    /// Blob on the new side; `None` when the file was deleted
    pub blob: Option<Oid>,
    /// Whether this change was computed against a real parent, not the empty tree
    pub has_parent: bool,
}

impl FileChange {
    pub fn is_deleted(&self) -> bool {
        self.status == ChangeStatus::Deleted
    }
}

/// List the files changed by `commit`
///
/// The commit is diffed against every parent and the union is returned, first
/// occurrence of a path winning. Root commits are diffed against the empty tree
/// and their changes are flagged with `has_parent == false`.
pub(crate) fn changed_files(
    repo: &GitRepository,
    commit: &Commit<'_>,
) -> Result<Vec<FileChange>, RepositoryError> {
    let git = repo.inner();
    let tree = commit.tree()?;
    let fail = |e: git2::Error| RepositoryError::DiffFailed {
        commit: commit.id().to_string(),
        reason: e.to_string(),
    };

    let mut parent_trees = Vec::with_capacity(commit.parent_count());
    for parent in commit.parents() {
        parent_trees.push(Some(parent.tree()?));
    }
    let has_parent = !parent_trees.is_empty();
    if !has_parent {
        parent_trees.push(None);
    }

    let mut seen = HashSet::new();
    let mut changes = Vec::new();

    for parent_tree in &parent_trees {
        let mut opts = DiffOptions::new();
        opts.context_lines(0).ignore_submodules(true);

        let diff = git
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))
            .map_err(fail)?;

        for delta in diff.deltas() {
            let status = ChangeStatus::from(delta.status());
            let new_path = delta.new_file().path();
            let old_path = delta.old_file().path();
            let Some(path) = new_path.or(old_path) else {
                continue;
            };
            let path = path.to_string_lossy().replace('\\', "/");

            if !seen.insert(path.clone()) {
                continue;
            }

            let blob = if status == ChangeStatus::Deleted || delta.new_file().id().is_zero() {
                None
            } else {
                Some(delta.new_file().id())
            };

            let old_path = old_path
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .filter(|p| *p != path);

            changes.push(FileChange {
                path,
                old_path,
                status,
                blob,
                has_parent,
            });
        }
    }

    Ok(changes)
}

/// Read the new-side blob of a change as UTF-8 text
///
/// Deleted, binary, oversized and non-UTF-8 blobs are reported as
/// `ContentDecodeError` so callers can skip them.
pub fn read_text(
    repo: &GitRepository,
    change: &FileChange,
    max_size: u64,
) -> Result<String, ContentDecodeError> {
    let oid = change
        .blob
        .ok_or_else(|| ContentDecodeError::ReadFailed {
            path: change.path.clone(),
            reason: "file was deleted".to_string(),
        })?;

    let size = repo
        .blob_size(oid)
        .map_err(|e| ContentDecodeError::ReadFailed {
            path: change.path.clone(),
            reason: e.to_string(),
        })?;
    if size > max_size {
        return Err(ContentDecodeError::TooLarge {
            path: change.path.clone(),
            size,
            max: max_size,
        });
    }

    let blob = repo
        .inner()
        .find_blob(oid)
        .map_err(|e| ContentDecodeError::ReadFailed {
            path: change.path.clone(),
            reason: e.to_string(),
        })?;

    if blob.is_binary() {
        return Err(ContentDecodeError::Binary(change.path.clone()));
    }

    std::str::from_utf8(blob.content())
        .map(|s| s.to_string())
        .map_err(|_| ContentDecodeError::InvalidUtf8(change.path.clone()))
}

/// Total new-side blob size of a set of changes, in bytes
pub(crate) fn total_size(repo: &GitRepository, changes: &[FileChange]) -> u64 {
    changes
        .iter()
        .filter_map(|c| c.blob)
        .filter_map(|oid| repo.blob_size(oid).ok())
        .sum()
}
