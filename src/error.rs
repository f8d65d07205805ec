/// Centralized error types for githound using thiserror
///
/// Only repository, format, configuration and validation errors reach the
/// caller. Decode and searcher errors are absorbed by the orchestrator and
/// only reduce the completeness of a search.
use thiserror::Error;

/// Main error type for githound
#[derive(Error, Debug)]
pub enum HoundError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Content decode error: {0}")]
    ContentDecode(#[from] ContentDecodeError),

    #[error("Searcher error: {0}")]
    Searcher(#[from] SearcherError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors resolving or reading the repository (fatal)
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Git repository not found at: {0}")]
    NotFound(String),

    #[error("Failed to open git repository: {0}")]
    OpenFailed(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Repository has no commits")]
    Empty,

    #[error("Failed to walk history: {0}")]
    WalkFailed(String),

    #[error("Failed to diff commit {commit}: {reason}")]
    DiffFailed { commit: String, reason: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// A blob could not be turned into searchable text (recoverable)
#[derive(Error, Debug)]
pub enum ContentDecodeError {
    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("File is binary: {0}")]
    Binary(String),

    #[error("File '{path}' exceeds maximum size: {size} > {max}")]
    TooLarge { path: String, size: u64, max: u64 },

    #[error("Failed to read blob for '{path}': {reason}")]
    ReadFailed { path: String, reason: String },
}

/// One searcher failed for one commit (recoverable)
#[derive(Error, Debug)]
pub enum SearcherError {
    #[error("Searcher '{searcher}' failed on commit {commit}: {reason}")]
    Failed {
        searcher: String,
        commit: String,
        reason: String,
    },

    #[error("Searcher '{0}' panicked")]
    Panicked(String),
}

/// Errors raised before formatting starts (fatal, pre-flight)
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Failed to serialize results: {0}")]
    SerializationFailed(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to query validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Empty {0}")]
    Empty(String),
}

impl From<anyhow::Error> for HoundError {
    fn from(err: anyhow::Error) -> Self {
        HoundError::Other(format!("{:#}", err))
    }
}

impl From<git2::Error> for HoundError {
    fn from(err: git2::Error) -> Self {
        HoundError::Repository(RepositoryError::Git(err))
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::SerializationFailed(err.to_string())
    }
}

impl From<serde_yaml::Error> for FormatError {
    fn from(err: serde_yaml::Error) -> Self {
        FormatError::SerializationFailed(err.to_string())
    }
}

impl From<csv::Error> for FormatError {
    fn from(err: csv::Error) -> Self {
        FormatError::SerializationFailed(err.to_string())
    }
}

impl HoundError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        HoundError::Other(msg.into())
    }

    /// Errors that abort an operation, as opposed to ones absorbed per file or commit
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HoundError::ContentDecode(_) | HoundError::Searcher(_))
    }

    /// Check if this is a user error (bad input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            HoundError::Validation(_)
                | HoundError::Format(FormatError::UnsupportedFormat(_))
                | HoundError::Format(FormatError::UnknownField(_))
                | HoundError::Config(ConfigError::InvalidValue { .. })
                | HoundError::Repository(RepositoryError::BranchNotFound(_))
                | HoundError::Repository(RepositoryError::RevisionNotFound(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HoundError::Repository(RepositoryError::BranchNotFound("dev".to_string()));
        assert_eq!(err.to_string(), "Repository error: Branch not found: dev");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HoundError = io_err.into();
        assert!(matches!(err, HoundError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: HoundError = anyhow::anyhow!("test error").into();
        assert!(matches!(err, HoundError::Other(_)));
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_error_from_git2() {
        let err: HoundError = git2::Error::from_str("bad object").into();
        assert!(matches!(
            err,
            HoundError::Repository(RepositoryError::Git(_))
        ));
    }

    #[test]
    fn test_is_fatal() {
        let decode = HoundError::ContentDecode(ContentDecodeError::InvalidUtf8("a.bin".into()));
        let searcher = HoundError::Searcher(SearcherError::Panicked("content".into()));
        let format = HoundError::Format(FormatError::UnsupportedFormat("xml".into()));
        let repo = HoundError::Repository(RepositoryError::Empty);

        assert!(!decode.is_fatal());
        assert!(!searcher.is_fatal());
        assert!(format.is_fatal());
        assert!(repo.is_fatal());
    }

    #[test]
    fn test_is_user_error() {
        let user_err = HoundError::Validation(ValidationError::Empty("pattern".into()));
        assert!(user_err.is_user_error());

        let system_err = HoundError::Io(std::io::Error::other("disk"));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_decode_error_too_large() {
        let err = ContentDecodeError::TooLarge {
            path: "big.txt".to_string(),
            size: 2048,
            max: 1024,
        };
        assert_eq!(
            err.to_string(),
            "File 'big.txt' exceeds maximum size: 2048 > 1024"
        );
    }

    #[test]
    fn test_searcher_error_display() {
        let err = SearcherError::Failed {
            searcher: "content".to_string(),
            commit: "abc1234".to_string(),
            reason: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Searcher 'content' failed on commit abc1234: boom"
        );
    }

    #[test]
    fn test_validation_error_constraint() {
        let err = ValidationError::ConstraintViolation {
            field: "fuzzy_threshold".to_string(),
            constraint: "between 0.0 and 1.0".to_string(),
            actual: "1.5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fuzzy_threshold must be between 0.0 and 1.0, got 1.5"
        );
    }

    #[test]
    fn test_error_chain() {
        let err: HoundError = FormatError::UnsupportedFormat("xml".to_string()).into();
        assert!(matches!(err, HoundError::Format(_)));
        assert_eq!(err.to_string(), "Format error: Unsupported output format: xml");
    }
}
