//! Throwaway repositories for unit tests

use super::GitRepository;
use git2::{Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

pub(crate) struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> GitRepository {
        GitRepository::open(self.dir.path()).unwrap()
    }

    /// Write `files`, stage them and commit on HEAD; returns the commit hash
    pub fn commit<C: AsRef<[u8]>>(
        &self,
        files: &[(&str, C)],
        message: &str,
        author: &str,
        time: i64,
    ) -> String {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&full, content.as_ref()).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        self.commit_index(&mut index, message, author, time)
    }

    /// Delete the loose object holding `path` as of `commit`
    pub fn remove_blob(&self, commit: &str, path: &str) {
        let commit = self.repo.find_commit(git2::Oid::from_str(commit).unwrap()).unwrap();
        let blob = commit.tree().unwrap().get_path(Path::new(path)).unwrap().id().to_string();
        let object = self
            .repo
            .path()
            .join("objects")
            .join(&blob[..2])
            .join(&blob[2..]);
        std::fs::remove_file(object).unwrap();
    }

    /// Remove `path` from the tree and commit
    pub fn delete(&self, path: &str, message: &str, author: &str, time: i64) -> String {
        let mut index = self.repo.index().unwrap();
        std::fs::remove_file(self.dir.path().join(path)).unwrap();
        index.remove_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self.commit_index(&mut index, message, author, time)
    }

    fn commit_index(
        &self,
        index: &mut git2::Index,
        message: &str,
        author: &str,
        time: i64,
    ) -> String {
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(time, 0)).unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    /// Create a branch at the current HEAD
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }
}
