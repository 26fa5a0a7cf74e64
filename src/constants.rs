//! Application constants for the SPED consolidator
//!
//! This module contains format constants and configuration defaults
//! used throughout the parser, converter and consolidation engine.

// =============================================================================
// Line Format
// =============================================================================

/// Field delimiter used by SPED files
pub const FIELD_DELIMITER: char = '|';

/// Length of a record code (e.g. `C100`)
pub const RECORD_CODE_LEN: usize = 4;

/// Shortest line that can hold a delimiter plus a record code
pub const MIN_RECORD_LINE_LEN: usize = 1 + RECORD_CODE_LEN;

/// Characters of an offending line kept in parse error messages
pub const LINE_PREVIEW_CHARS: usize = 100;

/// Column holding the record code in every layout
pub const RECORD_CODE_FIELD: &str = "REG";

/// Seed value of every relationship counter before its first row
pub const UNSET_RELATIONSHIP_INDEX: i64 = -1;

// =============================================================================
// Locale Number Format
// =============================================================================

/// Thousands separator used in SPED numeric fields (`1.234,56`)
pub const GROUPING_SEPARATOR: char = '.';

/// Decimal separator used in SPED numeric fields
pub const DECIMAL_SEPARATOR: char = ',';

// =============================================================================
// Processing Defaults
// =============================================================================

/// Maximum accepted input size in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

/// Tolerance for parent/child total comparisons (one centavo)
pub const DEFAULT_VALIDATION_TOLERANCE: f64 = 0.01;

/// Encodings tried in order against the byte sample
pub const DEFAULT_FALLBACK_ENCODINGS: &[&str] = &["utf-8", "latin-1"];

/// Encoding used when no fallback decodes the sample cleanly
pub const DEFAULT_ENCODING: &str = "latin-1";

/// Bytes read from the start of a file for encoding detection
pub const DEFAULT_ENCODING_SAMPLE_BYTES: usize = 256_000;

/// Number of warnings retained by the metrics collector
pub const DEFAULT_WARNING_CAP: usize = 100;

/// File extensions accepted without a warning
pub const EXPECTED_EXTENSIONS: &[&str] = &["txt", "sped"];

/// Number of record codes listed in metric summaries
pub const TOP_RECORDS_IN_SUMMARY: usize = 10;

// =============================================================================
// Configuration File
// =============================================================================

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "sped-consolidator";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

// =============================================================================
// Output
// =============================================================================

/// Appended to the group name for consolidated Parquet files
pub const CONSOLIDATED_SUFFIX: &str = "_CONSOLIDADO.parquet";
