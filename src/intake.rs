//! File intake: path checks, encoding detection and decoding

use crate::config::SpedConfig;
use crate::constants::EXPECTED_EXTENSIONS;
use crate::error::{Result, SpedError};
use encoding_rs::Encoding;
use std::path::Path;
use tracing::{debug, info, warn};

/// Resolves the text encoding of a file from a sample of its bytes
pub trait EncodingDetector: Send + Sync {
    /// Return an encoding label understood by `encoding_rs`
    fn detect(&self, sample: &[u8]) -> Result<String>;
}

/// Tries each configured label in order and keeps the first that decodes
/// the sample without errors
#[derive(Debug, Clone)]
pub struct FallbackEncodingDetector {
    candidates: Vec<String>,
    default: String,
}

impl FallbackEncodingDetector {
    pub fn new(candidates: Vec<String>, default: impl Into<String>) -> Self {
        Self {
            candidates,
            default: default.into(),
        }
    }

    pub fn from_config(config: &SpedConfig) -> Self {
        Self::new(config.fallback_encodings.clone(), config.default_encoding.clone())
    }
}

impl EncodingDetector for FallbackEncodingDetector {
    fn detect(&self, sample: &[u8]) -> Result<String> {
        for label in &self.candidates {
            let encoding = resolve_label(label)?;
            if decodes_cleanly(encoding, sample) {
                debug!("Sample decodes as {}", label);
                return Ok(label.clone());
            }
        }
        resolve_label(&self.default)?;
        debug!("No candidate decoded the sample, using {}", self.default);
        Ok(self.default.clone())
    }
}

fn resolve_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| SpedError::Encoding {
        path: Default::default(),
        reason: format!("Unsupported encoding '{}'", label),
    })
}

/// Strict decode of a sample; a UTF-8 sequence cut off by the sample
/// boundary is not held against the encoding
fn decodes_cleanly(encoding: &'static Encoding, sample: &[u8]) -> bool {
    if encoding == encoding_rs::UTF_8 {
        return match std::str::from_utf8(sample) {
            Ok(_) => true,
            Err(error) => error.error_len().is_none(),
        };
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(sample)
        .is_some()
}

/// Check that `path` is a non-empty regular file within the size ceiling.
/// Returns the file size in bytes.
pub fn validate_file_path(path: &Path, max_bytes: u64) -> Result<u64> {
    if !path.exists() {
        return Err(SpedError::file(path, "File not found"));
    }
    let metadata = std::fs::metadata(path)
        .map_err(|e| SpedError::file(path, format!("Cannot read metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(SpedError::file(path, "Path is not a file"));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(SpedError::file(path, "File is empty"));
    }
    if size > max_bytes {
        return Err(SpedError::file(
            path,
            format!(
                "File too large: {:.2} MB (maximum: {:.0} MB)",
                size as f64 / (1024.0 * 1024.0),
                max_bytes as f64 / (1024.0 * 1024.0)
            ),
        ));
    }

    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        let extension = extension.to_ascii_lowercase();
        if !EXPECTED_EXTENSIONS.contains(&extension.as_str()) {
            warn!("Unusual extension .{} for {}", extension, path.display());
        }
    }

    info!(
        "Validated {} ({:.1} KB)",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        size as f64 / 1024.0
    );
    Ok(size)
}

/// Validate, read and decode a file. Returns the text and the encoding used.
pub fn read_text(
    path: &Path,
    config: &SpedConfig,
    detector: &dyn EncodingDetector,
) -> Result<(String, String)> {
    validate_file_path(path, config.max_file_size_bytes())?;
    let bytes = std::fs::read(path).map_err(|e| SpedError::file(path, e.to_string()))?;

    let sample = &bytes[..bytes.len().min(config.encoding_sample_bytes)];
    let label = detector.detect(sample).map_err(|error| match error {
        SpedError::Encoding { reason, .. } => SpedError::encoding(path, reason),
        other => other,
    })?;
    let encoding = resolve_label(&label).map_err(|_| {
        SpedError::encoding(path, format!("Unsupported encoding '{}'", label))
    })?;

    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            "{} contains bytes that are invalid in {}; they were replaced",
            path.display(),
            label
        );
    }
    Ok((text.into_owned(), label))
}
