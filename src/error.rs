//! Error handling for SPED processing operations.
//!
//! Provides error types with context for file intake, line parsing,
//! structural validation and data export failures.

use std::path::PathBuf;
use thiserror::Error;

/// Metrics category used for line-level parse failures
pub const PARSE_ERROR_CATEGORY: &str = "Parse Error";

#[derive(Error, Debug)]
pub enum SpedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("File error: {reason}: {}", .path.display())]
    File { path: PathBuf, reason: String },

    #[error("Encoding error: {reason}: {}", .path.display())]
    Encoding { path: PathBuf, reason: String },

    #[error("Line {line_number}: {reason}\nContent: {preview}")]
    Parse {
        line_number: usize,
        reason: String,
        preview: String,
    },

    #[error("{message}{}", describe_location(.record, .field, .value))]
    Validation {
        message: String,
        record: Option<String>,
        field: Option<String>,
        value: Option<String>,
    },

    #[error("{message} (parent: {parent}, child: {child})")]
    Integrity {
        message: String,
        parent: String,
        child: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SpedError {
    pub fn file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn encoding(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error, truncating the offending line for display
    pub fn parse(line_number: usize, reason: impl Into<String>, line: &str) -> Self {
        Self::Parse {
            line_number,
            reason: reason.into(),
            preview: line_preview(line),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for input-level failures, including undecodable input
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::File { .. } | Self::Encoding { .. })
    }

    /// True for structural check failures, including total mismatches
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Integrity { .. })
    }

    /// Label under which this error is counted in processing metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO Error",
            Self::Polars(_) => "Polars Error",
            Self::Yaml(_) => "YAML Error",
            Self::File { .. } => "File Error",
            Self::Encoding { .. } => "Encoding Error",
            Self::Parse { .. } => PARSE_ERROR_CATEGORY,
            Self::Validation { .. } => "Validation Error",
            Self::Integrity { .. } => "Integrity Error",
            Self::Configuration { .. } => "Configuration Error",
        }
    }
}

fn line_preview(line: &str) -> String {
    const PREVIEW_CHARS: usize = crate::constants::LINE_PREVIEW_CHARS;

    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.chars().count() > PREVIEW_CHARS {
        let head: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

fn describe_location(
    record: &Option<String>,
    field: &Option<String>,
    value: &Option<String>,
) -> String {
    let details: Vec<String> = [("Record", record), ("Field", field), ("Value", value)]
        .into_iter()
        .filter_map(|(label, item)| item.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect();

    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, SpedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_preview_is_truncated() {
        let long_line = format!("|C100|{}|", "9".repeat(300));
        let error = SpedError::parse(12, "Line too short", &long_line);

        match &error {
            SpedError::Parse {
                line_number,
                preview,
                ..
            } => {
                assert_eq!(*line_number, 12);
                assert!(preview.ends_with("..."));
                assert_eq!(preview.chars().count(), 103);
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
        assert!(error.to_string().starts_with("Line 12:"));
    }

    #[test]
    fn test_error_subtypes() {
        let encoding = SpedError::encoding("/tmp/a.txt", "no viable encoding");
        assert!(encoding.is_file_error());
        assert!(!encoding.is_validation_error());

        let integrity = SpedError::Integrity {
            message: "Totals diverge".to_string(),
            parent: "C100".to_string(),
            child: "C170".to_string(),
        };
        assert!(integrity.is_validation_error());
        assert_eq!(
            integrity.to_string(),
            "Totals diverge (parent: C100, child: C170)"
        );
    }

    #[test]
    fn test_validation_error_message_lists_details() {
        let error = SpedError::Validation {
            message: "Required field is empty".to_string(),
            record: Some("C100".to_string()),
            field: Some("NUM_DOC".to_string()),
            value: None,
        };
        assert_eq!(
            error.to_string(),
            "Required field is empty (Record: C100, Field: NUM_DOC)"
        );
    }
}
