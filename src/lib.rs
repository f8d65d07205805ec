//! # GitHound - Multi-dimensional Git History Search
//!
//! A library for searching the history of a git repository along several
//! dimensions at once: file content, commit hash, author, message, date range,
//! file path and file type, with optional fuzzy matching.
//!
//! ## Overview
//!
//! A search walks commits newest-first and hands each commit to every
//! applicable searcher in registration order. Results are produced lazily:
//! the caller pulls them from a [`orchestrator::SearchStream`] (or receives
//! them over a bounded channel from [`orchestrator::SearchOrchestrator::spawn_search`]),
//! so a capped search stops walking history as soon as the cap is reached.
//!
//! Finished collections are post-processed by [`processor::ResultProcessor`]
//! (deduplicate, filter, sort, truncate, aggregate) and exported by
//! [`formatter`] as JSON, CSV or YAML.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │ CommitStream │──▶│ SearchOrchestr.  │──▶│  SearchStream   │──▶ results
//! │ (git walker) │   │ searcher registry│   │ (pull, bounded) │
//! └──────────────┘   └──────────────────┘   └─────────────────┘
//!                                                    │
//!                            ┌───────────────────────┤
//!                            ▼                       ▼
//!                   ┌─────────────────┐     ┌───────────────┐
//!                   │ ResultProcessor │────▶│   formatter   │
//!                   └─────────────────┘     └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`]: search driver, cancellation, progress and the async channel surface
//! - [`searcher`]: the `Searcher` trait and the built-in searchers
//! - [`git`]: repository access, history walking and blob decoding
//! - [`processor`]: deduplication, filtering, sorting and aggregation
//! - [`formatter`]: JSON, CSV and YAML export
//! - [`config`]: configuration file with environment variable overrides
//! - [`types`]: query, result and metrics types
//! - [`error`]: error types
//! - [`paths`]: platform config locations
//!
//! ## Usage Example
//!
//! ```no_run
//! use githound::git::GitRepository;
//! use githound::orchestrator::{SearchOptions, SearchOrchestrator};
//! use githound::types::SearchQuery;
//!
//! fn main() -> Result<(), githound::error::HoundError> {
//!     let repo = GitRepository::discover(".")?;
//!     let orchestrator = SearchOrchestrator::default();
//!
//!     let query = SearchQuery::content("TODO").with_author("alice");
//!     let options = SearchOptions::new().with_max_results(10);
//!
//!     for result in orchestrator.search(&repo, query, options)? {
//!         println!("{} {}:{:?}", result.commit_hash, result.file_path, result.line_number);
//!     }
//!     Ok(())
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Result export to JSON, CSV and YAML
pub mod formatter;

/// Git repository access, history walking and blob decoding
pub mod git;

/// Glob and path-prefix matching
pub mod glob_utils;

/// Search driver: lazy result stream, cancellation and progress
pub mod orchestrator;

/// Platform config locations
pub mod paths;

/// Post-processing of result collections
pub mod processor;

/// The `Searcher` trait and built-in searchers
pub mod searcher;

/// Query, result and metrics types
pub mod types;

pub use config::Config;
pub use error::HoundError;
pub use formatter::{FormatOptions, OutputFormat, format_results};
pub use orchestrator::{SearchOptions, SearchOrchestrator, SearchStream};
pub use processor::{FilterCriteria, ProcessOptions, ResultProcessor};
pub use types::{SearchQuery, SearchResult, SearchType};
