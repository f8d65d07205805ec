//! Throwaway repositories shared by the integration tests

use git2::{Repository, Signature, Time};
use githound::git::GitRepository;
use std::path::Path;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    repo: Repository,
}

impl Fixture {
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
    pub fn commit(&self, files: &[(&str, &str)], message: &str, author: &str, time: i64) -> String {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(time, 0)).unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
            .to_string()
    }
}

/// An initial commit followed by `n` commits "fix: bug N", each adding `fN.txt`
#[allow(dead_code)]
pub fn fix_history(n: i64) -> (Fixture, Vec<String>) {
    let fixture = Fixture::new();
    fixture.commit(&[("README.md", "# demo\n")], "init", "Alice", 1_000);
    let hashes = (1..=n)
        .map(|i| {
            fixture.commit(
                &[(format!("f{}.txt", i).as_str(), format!("TODO item {}\n", i).as_str())],
                &format!("fix: bug {}", i),
                if i % 2 == 0 { "Bob" } else { "Alice" },
                1_000 + i * 86_400,
            )
        })
        .collect();
    (fixture, hashes)
}
