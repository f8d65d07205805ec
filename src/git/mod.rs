//! Git repository access for history search
//!
//! Opens repositories, walks commit history newest-first with coarse filters
//! pushed down, lists the files each commit changed and decodes their blobs.

/// Changed-file extraction and blob decoding
pub mod diff;
/// Repository handle and revision resolution
pub mod repository;
/// Lazy filtered commit stream
pub mod walker;

#[cfg(test)]
pub(crate) mod test_repo;

pub use diff::{ChangeStatus, FileChange, read_text};
pub use repository::GitRepository;
pub use walker::{CommitStream, HistoryEntry, HistoryFilters, walk_history};
