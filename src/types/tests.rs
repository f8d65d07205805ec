use super::*;

fn sample_commit() -> CommitInfo {
    CommitInfo {
        hash: "a".repeat(40),
        short_hash: "aaaaaaa".to_string(),
        author_name: "Alice".to_string(),
        author_email: "alice@example.com".to_string(),
        committer_name: "Alice".to_string(),
        committer_email: "alice@example.com".to_string(),
        message: "Add parser\n\nLonger body".to_string(),
        timestamp: 1_704_067_200,
        files_changed: 1,
        insertions: 3,
        deletions: 0,
        parent_hashes: vec!["b".repeat(40)],
    }
}

#[test]
fn test_query_defaults() {
    let query = SearchQuery::default();
    assert_eq!(query.fuzzy_threshold, 0.8);
    assert!(!query.case_sensitive);
    assert!(!query.fuzzy_search);
    assert!(!query.has_criteria());
}

#[test]
fn test_query_deserialize_applies_defaults() {
    let query: SearchQuery = serde_json::from_str(r#"{"author_pattern": "Alice"}"#).unwrap();
    assert_eq!(query.author_pattern.as_deref(), Some("Alice"));
    assert_eq!(query.fuzzy_threshold, 0.8);
    assert!(query.file_extensions.is_empty());
    assert!(query.has_criteria());
}

#[test]
fn test_query_builders() {
    let query = SearchQuery::content("fn main")
        .with_author("alice")
        .with_extensions([".rs", "toml"])
        .fuzzy(0.6);

    assert!(query.needs_content());
    assert!(query.fuzzy_search);
    assert_eq!(query.fuzzy_threshold, 0.6);
    assert_eq!(query.file_extensions, vec![".rs", "toml"]);
    assert_eq!(query.author_pattern.as_deref(), Some("alice"));
}

#[test]
fn test_query_extensions_alone_are_criteria() {
    let query = SearchQuery::default().with_extensions(["py"]);
    assert!(query.has_criteria());
    assert!(!query.needs_content());
}

#[test]
fn test_parse_date_filter_unix_timestamp() {
    assert_eq!(parse_date_filter("1704067200").unwrap(), 1_704_067_200);
}

#[test]
fn test_parse_date_filter_rfc3339() {
    assert_eq!(
        parse_date_filter("2024-01-01T00:00:00Z").unwrap(),
        1_704_067_200
    );
}

#[test]
fn test_parse_date_filter_day() {
    assert_eq!(parse_date_filter("2024-01-01").unwrap(), 1_704_067_200);
}

#[test]
fn test_parse_date_filter_invalid() {
    assert!(parse_date_filter("yesterday").is_err());
}

#[test]
fn test_search_type_round_trip_names() {
    for search_type in SearchType::ALL {
        let parsed: SearchType = search_type.as_str().parse().unwrap();
        assert_eq!(parsed, search_type);
    }
    assert_eq!("File-Type".parse::<SearchType>().unwrap(), SearchType::FileType);
    assert!("semantic".parse::<SearchType>().is_err());
}

#[test]
fn test_search_type_serializes_snake_case() {
    let json = serde_json::to_string(&SearchType::DateRange).unwrap();
    assert_eq!(json, "\"date_range\"");
}

#[test]
fn test_commit_info_helpers() {
    let commit = sample_commit();
    assert_eq!(commit.summary(), "Add parser");
    assert_eq!(commit.day(), "2024-01-01");
    assert!(!commit.is_root());
    assert!(!commit.is_merge());
}

#[test]
fn test_result_score_is_clamped() {
    let commit = sample_commit();
    let high = SearchResult::new(&commit, "a.rs", SearchType::Content, 1.7);
    let low = SearchResult::new(&commit, "a.rs", SearchType::Content, -0.2);
    let nan = SearchResult::new(&commit, "a.rs", SearchType::Content, f64::NAN);

    assert_eq!(high.relevance_score, 1.0);
    assert_eq!(low.relevance_score, 0.0);
    assert_eq!(nan.relevance_score, 0.0);
}

#[test]
fn test_result_carries_commit_info() {
    let commit = sample_commit();
    let result = SearchResult::new(&commit, "src/lib.rs", SearchType::Content, 1.0)
        .with_line(12, "let x = 1;");

    assert_eq!(result.commit_hash, commit.hash);
    assert_eq!(result.author_name(), Some("Alice"));
    assert_eq!(result.timestamp(), Some(1_704_067_200));
    assert_eq!(result.line_number, Some(12));
    assert_eq!(result.matching_line.as_deref(), Some("let x = 1;"));
    assert_eq!(result.extension().as_deref(), Some("rs"));
}

#[test]
fn test_file_extension() {
    assert_eq!(file_extension("src/main.RS").as_deref(), Some("rs"));
    assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
    assert_eq!(file_extension(".gitignore"), None);
    assert_eq!(file_extension("Makefile"), None);
    assert_eq!(file_extension("dir.d/Makefile"), None);
}

#[test]
fn test_normalize_extension() {
    assert_eq!(normalize_extension(".PY"), "py");
    assert_eq!(normalize_extension("rs"), "rs");
}

#[test]
fn test_metrics_serialize_duration_as_millis() {
    let metrics = SearchMetrics {
        commits_searched: 3,
        duration: Duration::from_millis(1500),
        ..SearchMetrics::default()
    };
    let value = serde_json::to_value(&metrics).unwrap();
    assert_eq!(value["duration_ms"], 1500);
    assert_eq!(value["commits_searched"], 3);

    let back: SearchMetrics = serde_json::from_value(value).unwrap();
    assert_eq!(back, metrics);
}

#[test]
fn test_query_schema_lists_fields() {
    let schema = serde_json::to_value(query_schema()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    for field in ["content_pattern", "author_pattern", "fuzzy_threshold", "include_globs"] {
        assert!(properties.contains_key(field), "missing {}", field);
    }
}

#[test]
fn test_result_schema_lists_fields() {
    let schema = serde_json::to_value(result_schema()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    assert!(properties.contains_key("commit_hash"));
    assert!(properties.contains_key("search_type"));
    assert!(properties.contains_key("relevance_score"));
}
