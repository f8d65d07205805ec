//! Serialization of result collections to JSON, CSV and YAML
//!
//! JSON and YAML share one logical shape: an array of result objects, or a
//! `{metadata, results}` object when metadata is requested. CSV always uses
//! the canonical column order of [`ResultField::ALL`] (or the projected
//! fields), followed by one column per metadata key.

use crate::config::OutputConfig;
use crate::error::FormatError;
use crate::processor::ResultField;
use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(FormatError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Projection and envelope options
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Only these fields, in this order; `None` writes every field
    pub include_fields: Option<Vec<ResultField>>,
    pub include_metadata: bool,
    /// Caller-supplied metadata; `total_results` is added when missing
    pub metadata: Option<Map<String, Value>>,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict output to the named fields; unknown names are rejected
    pub fn with_field_names<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, FormatError> {
        let fields = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<ResultField>, FormatError>>()?;
        self.include_fields = Some(fields);
        Ok(self)
    }

    pub fn with_fields(mut self, fields: Vec<ResultField>) -> Self {
        self.include_fields = Some(fields);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }

    /// Options carrying the configured metadata switch
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            include_metadata: config.include_metadata,
            ..Self::default()
        }
    }

    fn metadata_for(&self, results: &[SearchResult]) -> Map<String, Value> {
        let mut metadata = self.metadata.clone().unwrap_or_default();
        metadata
            .entry("total_results")
            .or_insert_with(|| Value::from(results.len()));
        metadata
    }
}

/// Parse `format` and serialize `results`
///
/// The format name is checked before anything is serialized.
pub fn format_results_as(
    results: &[SearchResult],
    format: &str,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let format: OutputFormat = format.parse()?;
    format_results(results, format, options)
}

/// Serialize `results` in `format`
pub fn format_results(
    results: &[SearchResult],
    format: OutputFormat,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    tracing::debug!("Formatting {} results as {}", results.len(), format);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&document(results, options)?)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&document(results, options)?)?),
        OutputFormat::Csv => to_csv(results, options),
    }
}

/// The JSON/YAML document for `results`
fn document(results: &[SearchResult], options: &FormatOptions) -> Result<Value, FormatError> {
    let rows = results
        .iter()
        .map(|r| row(r, options))
        .collect::<Result<Vec<Value>, FormatError>>()?;

    if !options.include_metadata {
        return Ok(Value::Array(rows));
    }

    let mut envelope = Map::new();
    envelope.insert("metadata".to_string(), Value::Object(options.metadata_for(results)));
    envelope.insert("results".to_string(), Value::Array(rows));
    Ok(Value::Object(envelope))
}

fn row(result: &SearchResult, options: &FormatOptions) -> Result<Value, FormatError> {
    match &options.include_fields {
        None => Ok(serde_json::to_value(result)?),
        Some(fields) => Ok(Value::Object(
            fields
                .iter()
                .map(|f| (f.name().to_string(), f.value(result).to_json()))
                .collect(),
        )),
    }
}

fn to_csv(results: &[SearchResult], options: &FormatOptions) -> Result<String, FormatError> {
    let fields: &[ResultField] = options.include_fields.as_deref().unwrap_or(&ResultField::ALL[..]);
    let metadata: Vec<(String, String)> = if options.include_metadata {
        options
            .metadata_for(results)
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = fields
        .iter()
        .map(|f| f.name().to_string())
        .chain(metadata.iter().map(|(k, _)| k.clone()));
    writer.write_record(header)?;

    for result in results {
        let record = fields
            .iter()
            .map(|f| f.value(result).to_text())
            .chain(metadata.iter().map(|(_, v)| v.clone()));
        writer.write_record(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FormatError::SerializationFailed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FormatError::SerializationFailed(e.to_string()))
}
