use super::*;
use crate::searcher::test_support::commit_info;
use crate::types::{CommitInfo, SearchType};

fn commit(hash_char: char, author: &str, timestamp: i64) -> CommitInfo {
    commit_info(hash_char, author, timestamp)
}

/// A mix of duplicate commits, files, scores and types
fn sample() -> Vec<SearchResult> {
    let a = commit('a', "Alice", 3_000);
    let b = commit('b', "Bob", 2_000);
    let c = commit('c', "Alice", 1_000);
    vec![
        SearchResult::new(&a, "src/parser.py", SearchType::Content, 0.6).with_line(10, "x"),
        SearchResult::new(&a, "src/parser.py", SearchType::Content, 0.9).with_line(12, "y"),
        SearchResult::new(&a, "", SearchType::Author, 1.0),
        SearchResult::new(&b, "tests/test_parser.py", SearchType::Fuzzy, 0.75).with_line(3, "z"),
        SearchResult::new(&b, "src/lexer.rs", SearchType::Fuzzy, 0.8).with_line(1, "w"),
        SearchResult::new(&c, "docs/guide.md", SearchType::FilePath, 1.0),
        SearchResult::new(&c, "src/parser.py", SearchType::Content, 0.7).with_line(10, "x"),
    ]
}

fn no_dedup() -> ResultProcessor {
    ResultProcessor::new(ProcessorConfig {
        deduplicate: false,
        ..ProcessorConfig::default()
    })
}

#[test]
fn test_default_dedup_keeps_first_per_commit() {
    let processed = ResultProcessor::default().process_results(sample(), &ProcessOptions::new());
    let hashes: Vec<char> = processed
        .iter()
        .map(|r| r.commit_hash.chars().next().unwrap())
        .collect();
    assert_eq!(hashes, vec!['a', 'b', 'c']);
    assert_eq!(processed[0].relevance_score, 0.6);
    assert_eq!(processed[1].file_path, "tests/test_parser.py");
}

#[test]
fn test_dedup_highest_relevance() {
    let processor = ResultProcessor::new(ProcessorConfig {
        dedup_key: DedupKey::CommitAndFile,
        dedup_policy: DedupPolicy::HighestRelevance,
        ..ProcessorConfig::default()
    });
    let processed = processor.process_results(sample(), &ProcessOptions::new());

    assert_eq!(processed.len(), 6);
    assert_eq!(processed[0].file_path, "src/parser.py");
    assert_eq!(processed[0].relevance_score, 0.9);
    assert_eq!(processed[1].search_type, SearchType::Author);
}

#[test]
fn test_dedup_by_line() {
    let processor = ResultProcessor::new(ProcessorConfig {
        dedup_key: DedupKey::CommitFileLine,
        ..ProcessorConfig::default()
    });
    // Same file and line but different commits are distinct
    assert_eq!(processor.deduplicate(sample()).len(), 7);
}

#[test]
fn test_dedup_is_idempotent() {
    for key in [DedupKey::CommitHash, DedupKey::CommitAndFile, DedupKey::CommitFileLine] {
        for policy in [DedupPolicy::FirstSeen, DedupPolicy::HighestRelevance] {
            let processor = ResultProcessor::new(ProcessorConfig {
                deduplicate: true,
                dedup_key: key,
                dedup_policy: policy,
            });
            let once = processor.process_results(sample(), &ProcessOptions::new());
            let twice = processor.process_results(once.clone(), &ProcessOptions::new());
            assert_eq!(once, twice, "{:?}/{:?}", key, policy);
        }
    }
}

#[test]
fn test_max_results_bounds_output() {
    for n in 0..10 {
        let processed = no_dedup().process_results(sample(), &ProcessOptions::new().with_max_results(n));
        assert!(processed.len() <= n);
        assert_eq!(processed.len(), n.min(7));
    }
}

#[test]
fn test_truncation_happens_after_sort() {
    let options = ProcessOptions::new()
        .sorted_by(ResultField::RelevanceScore, SortOrder::Descending)
        .with_max_results(2);
    let processed = no_dedup().process_results(sample(), &options);
    assert!(processed.iter().all(|r| r.relevance_score == 1.0));
}

#[test]
fn test_sort_is_stable_and_ordered() {
    for field in [
        ResultField::RelevanceScore,
        ResultField::Date,
        ResultField::LineNumber,
        ResultField::FilePath,
        ResultField::AuthorName,
    ] {
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let input = sample();
            let processed = no_dedup().process_results(input.clone(), &ProcessOptions::new().sorted_by(field, order));
            assert_eq!(processed.len(), input.len());

            for pair in processed.windows(2) {
                let (a, b) = (field.value(&pair[0]), field.value(&pair[1]));
                match order {
                    SortOrder::Ascending => assert!(a <= b, "{} {:?}", field, order),
                    SortOrder::Descending => assert!(a >= b, "{} {:?}", field, order),
                }
                // Ties keep input order
                if a == b {
                    let pos = |r: &SearchResult| input.iter().position(|x| x == r).unwrap();
                    assert!(pos(&pair[0]) < pos(&pair[1]), "{} {:?} not stable", field, order);
                }
            }
        }
    }
}

#[test]
fn test_sort_by_date_descending() {
    let processed = no_dedup().process_results(
        sample(),
        &ProcessOptions::new().sorted_by(ResultField::Date, SortOrder::Descending),
    );
    let first: Vec<char> = processed
        .iter()
        .map(|r| r.commit_hash.chars().next().unwrap())
        .collect();
    assert_eq!(first, vec!['a', 'a', 'a', 'b', 'b', 'c', 'c']);
}

#[test]
fn test_filter_conjunction_and_relaxation() {
    let strict = FilterCriteria::new().with_min_relevance(0.7).with_extensions([".py"]);
    let processed = no_dedup().process_results(sample(), &ProcessOptions::new().with_filter(strict));

    assert!(!processed.is_empty());
    assert!(
        processed
            .iter()
            .all(|r| r.file_path.ends_with(".py") && r.relevance_score >= 0.7)
    );

    let only_score = FilterCriteria::new().with_min_relevance(0.7);
    let only_ext = FilterCriteria::new().with_extensions([".py"]);
    for relaxed in [only_score, only_ext] {
        let wider = no_dedup().process_results(sample(), &ProcessOptions::new().with_filter(relaxed));
        assert!(processed.iter().all(|r| wider.contains(r)));
        assert!(wider.len() >= processed.len());
    }
}

#[test]
fn test_filter_excluding_tests_and_types() {
    let criteria = FilterCriteria::new()
        .excluding_test_files()
        .with_search_types(vec![SearchType::Fuzzy]);
    let processed = no_dedup().process_results(sample(), &ProcessOptions::new().with_filter(criteria));
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].file_path, "src/lexer.rs");
}

#[test]
fn test_summarize_and_aggregate_through_processor() {
    let processor = ResultProcessor::default();
    let results = sample();

    let groups = processor.aggregate_results(&results, AggregationStrategy::ByAuthor);
    assert_eq!(groups["Alice"].len(), 5);
    assert_eq!(groups["Bob"].len(), 2);

    let summary = processor.summarize(&results);
    assert_eq!(summary.total_results, 7);
    assert_eq!(summary.unique_commits, 3);
    assert_eq!(summary.unique_authors, 2);
}

#[test]
fn test_parse_config_enums() {
    assert_eq!("commit_and_file".parse::<DedupKey>().unwrap(), DedupKey::CommitAndFile);
    assert_eq!("highest-relevance".parse::<DedupPolicy>().unwrap(), DedupPolicy::HighestRelevance);
    assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
    assert!("sideways".parse::<SortOrder>().is_err());
}
