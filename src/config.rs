/// githound configuration
///
/// Precedence, highest first: `GITHOUND_*` environment variables, the TOML
/// file, built-in defaults.
use crate::error::{ConfigError, HoundError};
use crate::formatter::OutputFormat;
use crate::processor::{DedupPolicy, ProcessorConfig};
use crate::types::SearchQuery;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search and orchestration settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Result post-processing settings
    #[serde(default)]
    pub processing: ProcessorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Blobs larger than this many bytes are not searched
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Default similarity threshold for fuzzy queries (0.0 to 1.0)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Lines of context captured around content matches
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Commits between two progress callbacks
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Run the searchers of one commit on the rayon pool
    #[serde(default)]
    pub parallel_searchers: bool,

    /// Results buffered between the search task and an async consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Wrap results in a `{metadata, results}` envelope
    #[serde(default)]
    pub include_metadata: bool,
}

fn default_max_file_size() -> u64 {
    1_048_576 // 1 MB
}

fn default_fuzzy_threshold() -> f64 {
    crate::types::default_fuzzy_threshold()
}

fn default_context_lines() -> usize {
    crate::searcher::DEFAULT_CONTEXT_LINES
}

fn default_progress_interval() -> usize {
    25
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            fuzzy_threshold: default_fuzzy_threshold(),
            context_lines: default_context_lines(),
            progress_interval: default_progress_interval(),
            parallel_searchers: false,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_metadata: false,
        }
    }
}

impl SearchConfig {
    /// An empty query carrying the configured fuzzy threshold and file size limit
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            fuzzy_threshold: self.fuzzy_threshold,
            max_file_size: Some(self.max_file_size),
            ..SearchQuery::default()
        }
    }
}

impl Config {
    /// Read, parse and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, HoundError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            Err(e) => return Err(ConfigError::LoadFailed(format!("{}: {}", path.display(), e)).into()),
        };

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The file at [`PlatformPaths::default_config_path`], or defaults when absent
    ///
    /// [`PlatformPaths::default_config_path`]: crate::paths::PlatformPaths::default_config_path
    pub fn load_or_default() -> Result<Self, HoundError> {
        let path = crate::paths::PlatformPaths::default_config_path();
        match Self::from_file(&path) {
            Err(HoundError::Config(ConfigError::FileNotFound(_))) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the config as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), HoundError> {
        let save_failed = |e: &dyn std::fmt::Display| ConfigError::SaveFailed(format!("{}: {}", path.display(), e));

        let content = toml::to_string_pretty(self).map_err(|e| save_failed(&e))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| save_failed(&e))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(&e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), HoundError> {
        if self.search.max_file_size == 0 {
            return Err(invalid("search.max_file_size", "must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.search.fuzzy_threshold) {
            return Err(invalid(
                "search.fuzzy_threshold",
                format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.search.fuzzy_threshold
                ),
            ));
        }

        if self.search.progress_interval == 0 {
            return Err(invalid("search.progress_interval", "must be greater than 0"));
        }

        if self.search.channel_capacity == 0 {
            return Err(invalid("search.channel_capacity", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(size) = env_parse("GITHOUND_MAX_FILE_SIZE") {
            self.search.max_file_size = size;
        }

        if let Some(threshold) = env_parse("GITHOUND_FUZZY_THRESHOLD") {
            self.search.fuzzy_threshold = threshold;
        }

        if let Some(lines) = env_parse("GITHOUND_CONTEXT_LINES") {
            self.search.context_lines = lines;
        }

        if let Some(parallel) = env_parse("GITHOUND_PARALLEL_SEARCHERS") {
            self.search.parallel_searchers = parallel;
        }

        if let Some(format) = env_parse::<OutputFormat>("GITHOUND_OUTPUT_FORMAT") {
            self.output.format = format;
        }

        if let Some(policy) = env_parse::<DedupPolicy>("GITHOUND_DEDUP_POLICY") {
            self.processing.dedup_policy = policy;
        }
    }

    /// Create a new Config with defaults, file contents and environment overrides
    pub fn new() -> Result<Self, HoundError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> HoundError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
