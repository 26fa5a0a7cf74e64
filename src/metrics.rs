//! Processing metrics for parsing passes
//!
//! One [`ProcessingMetrics`] value is produced per file; batch runs merge
//! them into a single report.

use crate::constants::{DEFAULT_WARNING_CAP, TOP_RECORDS_IN_SUMMARY};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::info;

/// Counters and timings collected while processing one or more files
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingMetrics {
    /// File name or label the metrics belong to
    pub source: String,

    /// Every line seen, including blank and malformed ones
    pub total_lines: usize,

    /// Lines attributed to a record code present in the schema
    pub processed_lines: usize,

    /// Blank lines and lines not starting with the delimiter
    pub skipped_lines: usize,

    /// Lines whose record code has no layout
    pub unknown_lines: usize,

    /// Lines that failed to parse
    pub error_lines: usize,

    /// Numeric fields that could not be converted
    pub conversion_failures: usize,

    /// Line count per record code, known and unknown
    pub records_by_code: BTreeMap<String, usize>,

    /// Error count per error category
    pub errors_by_category: BTreeMap<String, usize>,

    /// Most recent warnings, oldest dropped first
    pub warnings: VecDeque<String>,

    /// Maximum number of retained warnings
    pub max_warnings: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProcessingMetrics {
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_warning_cap(source, DEFAULT_WARNING_CAP)
    }

    pub fn with_warning_cap(source: impl Into<String>, max_warnings: usize) -> Self {
        Self {
            source: source.into(),
            total_lines: 0,
            processed_lines: 0,
            skipped_lines: 0,
            unknown_lines: 0,
            error_lines: 0,
            conversion_failures: 0,
            records_by_code: BTreeMap::new(),
            errors_by_category: BTreeMap::new(),
            warnings: VecDeque::new(),
            max_warnings,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Count a line attributed to a known record code
    pub fn record_line(&mut self, code: &str) {
        self.total_lines += 1;
        self.processed_lines += 1;
        *self.records_by_code.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Count a line whose record code has no layout
    pub fn record_unknown(&mut self, code: &str) {
        self.total_lines += 1;
        self.unknown_lines += 1;
        *self.records_by_code.entry(code.to_string()).or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self) {
        self.total_lines += 1;
        self.skipped_lines += 1;
    }

    /// Count a malformed line under its error category
    pub fn record_error(&mut self, category: &str) {
        self.total_lines += 1;
        self.error_lines += 1;
        self.record_error_category(category);
    }

    /// Count an error that is not tied to a single line
    pub fn record_error_category(&mut self, category: &str) {
        *self
            .errors_by_category
            .entry(category.to_string())
            .or_insert(0) += 1;
    }

    pub fn add_conversion_failures(&mut self, count: usize) {
        self.conversion_failures += count;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        if self.max_warnings == 0 {
            return;
        }
        while self.warnings.len() >= self.max_warnings {
            self.warnings.pop_front();
        }
        self.warnings.push_back(warning.into());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Seconds between start and finish (or now, while still running)
    pub fn elapsed_seconds(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        let elapsed = end - self.started_at;
        elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0
    }

    /// Percentage of lines attributed to a known record code
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.processed_lines as f64 / self.total_lines as f64) * 100.0
        }
    }

    /// Attributed lines per second
    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed <= 0.0 {
            0.0
        } else {
            self.processed_lines as f64 / elapsed
        }
    }

    /// Most frequent record codes, ties broken by code
    pub fn top_records(&self, n: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .records_by_code
            .iter()
            .map(|(code, count)| (code.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts.truncate(n);
        counts
    }

    /// Fold another file's metrics into this one
    pub fn merge(&mut self, other: &ProcessingMetrics) {
        self.total_lines += other.total_lines;
        self.processed_lines += other.processed_lines;
        self.skipped_lines += other.skipped_lines;
        self.unknown_lines += other.unknown_lines;
        self.error_lines += other.error_lines;
        self.conversion_failures += other.conversion_failures;

        for (code, count) in &other.records_by_code {
            *self.records_by_code.entry(code.clone()).or_insert(0) += count;
        }
        for (category, count) in &other.errors_by_category {
            *self.errors_by_category.entry(category.clone()).or_insert(0) += count;
        }
        for warning in &other.warnings {
            self.add_warning(warning.clone());
        }

        self.started_at = self.started_at.min(other.started_at);
        self.finished_at = match (self.finished_at, other.finished_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} lines, {} processed ({:.1}%), {} errors, {} unknown, {} skipped in {:.2}s",
            self.source,
            self.total_lines,
            self.processed_lines,
            self.success_rate(),
            self.error_lines,
            self.unknown_lines,
            self.skipped_lines,
            self.elapsed_seconds()
        )
    }

    /// Emit a multi-line summary through `tracing`
    pub fn log_summary(&self) {
        info!("Processing summary for {}", self.source);
        info!(
            "  Lines: {} total, {} processed, {} skipped, {} unknown, {} errors",
            self.total_lines,
            self.processed_lines,
            self.skipped_lines,
            self.unknown_lines,
            self.error_lines
        );
        info!(
            "  Success rate: {:.1}%, {:.0} lines/s, {:.2}s elapsed",
            self.success_rate(),
            self.lines_per_second(),
            self.elapsed_seconds()
        );
        if self.conversion_failures > 0 {
            info!("  Numeric conversion failures: {}", self.conversion_failures);
        }
        for (code, count) in self.top_records(TOP_RECORDS_IN_SUMMARY) {
            info!("  {}: {}", code, count);
        }
        for (category, count) in &self.errors_by_category {
            info!("  {}: {}", category, count);
        }
    }
}

impl Default for ProcessingMetrics {
    fn default() -> Self {
        Self::new("")
    }
}
