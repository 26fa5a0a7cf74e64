//! Configuration management and validation.
//!
//! A [`SpedConfig`] is built once by the caller (defaults, optionally
//! overlaid by a YAML file and command-line flags) and handed to the
//! processor. Nothing reads configuration from global state mid-pass.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ENCODING, DEFAULT_ENCODING_SAMPLE_BYTES,
    DEFAULT_FALLBACK_ENCODINGS, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_VALIDATION_TOLERANCE,
    DEFAULT_WARNING_CAP,
};
use crate::error::{Result, SpedError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Caller-facing configuration for SPED processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpedConfig {
    /// Largest accepted input file, in megabytes
    pub max_file_size_mb: u64,

    /// Abort the pass on the first malformed line instead of skipping it
    pub strict_mode: bool,

    /// Tolerance used by cross-reference total checks
    pub validation_tolerance: f64,

    /// Encoding labels tried in order during detection
    pub fallback_encodings: Vec<String>,

    /// Encoding used when no fallback decodes the sample
    pub default_encoding: String,

    /// Bytes sampled from the file head for encoding detection
    pub encoding_sample_bytes: usize,

    /// Run required-field checks on parsed tables
    pub validate_required_fields: bool,

    /// Number of warnings kept in metrics (oldest dropped first)
    pub max_warnings: usize,

    /// Files processed concurrently by batch runs
    pub workers: usize,

    /// Show a progress bar during batch runs
    pub show_progress: bool,
}

impl Default for SpedConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            strict_mode: false,
            validation_tolerance: DEFAULT_VALIDATION_TOLERANCE,
            fallback_encodings: DEFAULT_FALLBACK_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_encoding: DEFAULT_ENCODING.to_string(),
            encoding_sample_bytes: DEFAULT_ENCODING_SAMPLE_BYTES,
            validate_required_fields: true,
            max_warnings: DEFAULT_WARNING_CAP,
            workers: num_cpus::get().max(1),
            show_progress: false,
        }
    }
}

impl SpedConfig {
    /// Enable strict mode (first line error aborts the pass)
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set the maximum accepted file size in megabytes
    pub fn with_max_file_size_mb(mut self, max_mb: u64) -> Self {
        self.max_file_size_mb = max_mb;
        self
    }

    /// Set the tolerance for cross-reference total checks
    pub fn with_validation_tolerance(mut self, tolerance: f64) -> Self {
        self.validation_tolerance = tolerance;
        self
    }

    /// Replace the fallback encoding list
    pub fn with_fallback_encodings<I, S>(mut self, encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_encodings = encodings.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of concurrent file workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Toggle required-field validation
    pub fn with_required_field_validation(mut self, enabled: bool) -> Self {
        self.validate_required_fields = enabled;
        self
    }

    /// Toggle the batch progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Size ceiling in bytes, saturating at `u64::MAX`
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Check that every knob holds a usable value
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_mb == 0 {
            return Err(SpedError::configuration(
                "max_file_size_mb must be greater than zero",
            ));
        }
        if self.max_file_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(SpedError::configuration(format!(
                "max_file_size_mb is too large, got {}",
                self.max_file_size_mb
            )));
        }
        if !self.validation_tolerance.is_finite() || self.validation_tolerance < 0.0 {
            return Err(SpedError::configuration(format!(
                "validation_tolerance must be a non-negative number, got {}",
                self.validation_tolerance
            )));
        }
        if self.default_encoding.trim().is_empty() {
            return Err(SpedError::configuration("default_encoding must not be empty"));
        }
        if self.encoding_sample_bytes == 0 {
            return Err(SpedError::configuration(
                "encoding_sample_bytes must be greater than zero",
            ));
        }
        if self.workers == 0 {
            return Err(SpedError::configuration("workers must be at least 1"));
        }
        Ok(())
    }

    /// Parse configuration from YAML text; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Platform location of the default configuration file
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| SpedError::configuration("Could not determine config directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpedConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.strict_mode);
        assert_eq!(config.max_file_size_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.fallback_encodings, vec!["utf-8", "latin-1"]);
    }

    #[test]
    fn test_builder_methods() {
        let config = SpedConfig::default()
            .with_strict_mode(true)
            .with_max_file_size_mb(5)
            .with_validation_tolerance(0.5)
            .with_fallback_encodings(["windows-1252"])
            .with_workers(2);

        assert!(config.strict_mode);
        assert_eq!(config.max_file_size_mb, 5);
        assert_eq!(config.validation_tolerance, 0.5);
        assert_eq!(config.fallback_encodings, vec!["windows-1252"]);
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SpedConfig::default().with_workers(0).validate().is_err());
        assert!(
            SpedConfig::default()
                .with_validation_tolerance(-1.0)
                .validate()
                .is_err()
        );
        assert!(
            SpedConfig::default()
                .with_max_file_size_mb(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "strict_mode: true").unwrap();
        writeln!(file, "max_file_size_mb: 250").unwrap();

        let config = SpedConfig::from_yaml_file(file.path()).unwrap();
        assert!(config.strict_mode);
        assert_eq!(config.max_file_size_mb, 250);
        assert_eq!(config.validation_tolerance, DEFAULT_VALIDATION_TOLERANCE);
        assert_eq!(config.default_encoding, DEFAULT_ENCODING);
    }

    #[test]
    fn test_oversized_file_limit_is_rejected() {
        let result = SpedConfig::from_yaml_str("max_file_size_mb: 18446744073709551615\n");
        assert!(matches!(result, Err(SpedError::Configuration { .. })));

        let config = SpedConfig::default().with_max_file_size_mb(u64::MAX);
        assert!(config.validate().is_err());
        assert_eq!(config.max_file_size_bytes(), u64::MAX);

        let largest = u64::MAX / BYTES_PER_MB;
        let config = SpedConfig::default().with_max_file_size_mb(largest);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes(), largest * BYTES_PER_MB);
    }

    #[test]
    fn test_invalid_yaml_value_is_configuration_error() {
        let result = SpedConfig::from_yaml_str("workers: 0\n");
        assert!(matches!(result, Err(SpedError::Configuration { .. })));
    }
}
