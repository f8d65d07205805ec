/// End-to-end search scenarios against real repositories
mod common;

use common::{Fixture, fix_history};
use githound::error::{HoundError, RepositoryError};
use githound::orchestrator::{SearchOptions, SearchOrchestrator, SearchState};
use githound::types::{SearchQuery, SearchType};
use std::sync::Arc;

#[test]
fn test_content_match_on_changed_line() {
    let fixture = Fixture::new();
    fixture.commit(&[("notes.txt", "alpha\nbeta\ngamma\n")], "add notes", "Alice", 1_000);
    let second = fixture.commit(
        &[("notes.txt", "alpha\nbeta patched\ngamma\n")],
        "patch beta",
        "Alice",
        2_000,
    );

    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();
    let mut stream = orchestrator
        .search(&repo, SearchQuery::content("beta patched"), SearchOptions::new())
        .unwrap();
    let results = stream.collect_results();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].commit_hash, second);
    assert_eq!(results[0].file_path, "notes.txt");
    assert_eq!(results[0].line_number, Some(2));
    assert_eq!(results[0].search_type, SearchType::Content);
    assert_eq!(stream.state(), SearchState::Completed);
}

#[test]
fn test_author_filter_only_tags_matching_commits() {
    let fixture = Fixture::new();
    let a1 = fixture.commit(&[("a.txt", "1\n")], "first", "Alice", 1_000);
    let b1 = fixture.commit(&[("b.txt", "2\n")], "second", "Bob", 2_000);
    let a2 = fixture.commit(&[("c.txt", "3\n")], "third", "Alice", 3_000);

    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();
    let results = orchestrator
        .search(&repo, SearchQuery::author("Alice"), SearchOptions::new())
        .unwrap()
        .collect::<Vec<_>>();

    let hashes: Vec<&str> = results.iter().map(|r| r.commit_hash.as_str()).collect();
    assert_eq!(hashes, vec![a2.as_str(), a1.as_str()]);
    assert!(!hashes.contains(&b1.as_str()));
    assert!(results.iter().all(|r| r.author_name() == Some("Alice")));
}

#[test]
fn test_max_results_stops_history_walk() {
    let (fixture, hashes) = fix_history(5);
    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();

    let mut stream = orchestrator
        .search(&repo, SearchQuery::message("fix"), SearchOptions::new().with_max_results(1))
        .unwrap();
    let results = stream.collect_results();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].commit_hash, hashes[4]);
    // The newest commit already matches, so nothing older is read
    assert_eq!(stream.commits_walked(), 1);
    assert_eq!(stream.state(), SearchState::Completed);
}

#[test]
fn test_cancel_mid_stream() {
    let (fixture, _) = fix_history(5);
    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();

    let mut stream = orchestrator
        .search(&repo, SearchQuery::message("fix"), SearchOptions::new())
        .unwrap();

    let first = stream.next();
    assert!(first.is_some());
    stream.cancellation().cancel("user abort");
    let rest = stream.collect_results();

    assert!(1 + rest.len() < 5);
    assert_eq!(stream.state(), SearchState::Cancelled);
    assert_eq!(stream.cancellation().reason(), Some("user abort"));
    assert!(stream.failure().is_none());
}

#[test]
fn test_combined_dimensions() {
    let (fixture, hashes) = fix_history(4);
    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();

    // Bob authored bugs 2 and 4; content matches restrict to their files
    let query = SearchQuery::content("TODO").with_author("Bob");
    let results: Vec<_> = orchestrator
        .search(&repo, query, SearchOptions::new())
        .unwrap()
        .collect();

    let content: Vec<_> = results
        .iter()
        .filter(|r| r.search_type == SearchType::Content)
        .map(|r| (r.commit_hash.as_str(), r.file_path.as_str()))
        .collect();
    assert_eq!(
        content,
        vec![(hashes[3].as_str(), "f4.txt"), (hashes[1].as_str(), "f2.txt")]
    );
    assert!(results.iter().all(|r| r.author_name() == Some("Bob")));
}

#[test]
fn test_missing_repository_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = githound::git::GitRepository::open(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound(_) | RepositoryError::OpenFailed(_)
    ));
}

#[test]
fn test_invalid_query_rejected_before_walk() {
    let (fixture, _) = fix_history(1);
    let repo = fixture.open();
    let orchestrator = SearchOrchestrator::default();

    let err = orchestrator
        .search(&repo, SearchQuery::content("(unclosed"), SearchOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, HoundError::Validation(_)));
    assert!(err.is_user_error());
}

#[tokio::test]
async fn test_spawned_search_streams_over_channel() {
    let (fixture, hashes) = fix_history(3);
    let orchestrator = Arc::new(SearchOrchestrator::default());

    let mut receiver = orchestrator
        .spawn_search(fixture.path(), SearchQuery::message("fix"), SearchOptions::new())
        .await
        .unwrap();

    let mut got = Vec::new();
    while let Some(result) = receiver.recv().await {
        got.push(result.commit_hash);
    }
    let expected: Vec<String> = hashes.iter().rev().cloned().collect();
    assert_eq!(got, expected);

    let summary = receiver.finish().await.unwrap();
    assert_eq!(summary.state, SearchState::Completed);
    assert_eq!(summary.metrics.results_found, 3);
}
