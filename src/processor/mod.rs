//! Processing pipeline for SPED files
//!
//! A file goes through intake, a sequential parsing pass, numeric
//! conversion and enrichment. The enriched tables then become DataFrames
//! for the optional required-field checks and the consolidation of every
//! group. Batches run one pass per file on the blocking pool, at most
//! `workers` at a time, and concatenate the frames in input order.

use crate::config::SpedConfig;
use crate::consolidate::consolidate_all;
use crate::convert::{convert_tables, enrich_tables};
use crate::error::{Result, SpedError};
use crate::frame::{FrameSet, concat_frame_sets, tables_to_frames};
use crate::intake::{EncodingDetector, FallbackEncodingDetector, read_text};
use crate::metrics::ProcessingMetrics;
use crate::parser::{IndexPlan, SpedParser};
use crate::schema::{GroupRegistry, SpedSchema};
use crate::validation::{
    TotalDivergence, cross_reference_totals, default_required_fields, missing_required_fields,
};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info, warn};

/// Everything produced from one file
#[derive(Debug, Clone)]
pub struct FileOutput {
    /// File path or caller-supplied label
    pub source: String,

    /// Encoding the file was decoded with; `None` for in-memory text
    pub encoding: Option<String>,

    /// Converted and enriched frames keyed by record code
    pub tables: FrameSet,

    /// Consolidated frames keyed by group name
    pub consolidated: FrameSet,

    pub metrics: ProcessingMetrics,
}

/// A file that could not be processed in a lenient batch
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub category: String,
    pub message: String,
}

/// Merged results of a batch run
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Raw frames concatenated across files in input order
    pub tables: FrameSet,

    /// Consolidated frames concatenated across files in input order
    pub consolidated: FrameSet,

    /// Metrics of all successful files merged together
    pub metrics: ProcessingMetrics,

    /// Per-file metrics in input order
    pub file_metrics: Vec<ProcessingMetrics>,

    pub failures: Vec<FileFailure>,
}

impl BatchOutput {
    pub fn files_processed(&self) -> usize {
        self.file_metrics.len()
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Runs the pipeline for a fixed schema and configuration
#[derive(Clone)]
pub struct SpedProcessor {
    config: SpedConfig,
    parser: SpedParser,
    groups: Arc<GroupRegistry>,
    detector: Arc<dyn EncodingDetector>,
}

impl std::fmt::Debug for SpedProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpedProcessor")
            .field("config", &self.config)
            .field("layouts", &self.parser.layouts().len())
            .field("groups", &self.groups.len())
            .finish()
    }
}

impl SpedProcessor {
    /// Validate schema and configuration and derive the index plan
    pub fn new(schema: SpedSchema, config: SpedConfig) -> Result<Self> {
        config.validate()?;
        let (layouts, groups) = schema.into_registries()?;
        let plan = IndexPlan::derive(&groups);
        debug!(
            "Schema ready: {} layouts, {} groups, {} indexed records",
            layouts.len(),
            groups.len(),
            plan.len()
        );

        let parser = SpedParser::new(Arc::new(layouts), Arc::new(plan), &config);
        let detector = Arc::new(FallbackEncodingDetector::from_config(&config));
        Ok(Self {
            config,
            parser,
            groups: Arc::new(groups),
            detector,
        })
    }

    /// Replace the bundled encoding detector
    pub fn with_detector(mut self, detector: Arc<dyn EncodingDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &SpedConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Run the pipeline on already-decoded text
    pub fn process_text(&self, source: &str, text: &str) -> Result<FileOutput> {
        let parsed = self.parser.parse_str(source, text)?;
        let mut tables = parsed.tables;
        let mut metrics = parsed.metrics;

        convert_tables(&mut tables, self.parser.layouts(), &mut metrics);
        enrich_tables(&mut tables);
        let tables = tables_to_frames(&tables)?;

        if self.config.validate_required_fields {
            self.check_required_fields(&tables, &mut metrics)?;
        }

        let consolidated = consolidate_all(&self.groups, &tables)?;
        metrics.finish();
        info!("{}", metrics.summary());

        Ok(FileOutput {
            source: source.to_string(),
            encoding: None,
            tables,
            consolidated,
            metrics,
        })
    }

    /// Read, decode and process one file
    pub fn process_file(&self, path: &Path) -> Result<FileOutput> {
        debug!("Processing {}", path.display());
        let (text, encoding) = read_text(path, &self.config, self.detector.as_ref())?;
        let mut output = self.process_text(&path.display().to_string(), &text)?;
        output.encoding = Some(encoding);
        Ok(output)
    }

    /// Process several files concurrently and merge the results.
    ///
    /// Results keep the order of `paths`. In strict mode the first failing
    /// file (in input order) aborts the batch; otherwise failures are
    /// collected and the remaining files are merged.
    pub async fn process_files(&self, paths: &[PathBuf]) -> Result<BatchOutput> {
        let workers = self.config.workers.max(1);
        let progress = self.progress_bar(paths.len());

        let results: Vec<(PathBuf, Result<FileOutput>)> = stream::iter(paths.iter().cloned())
            .map(|path| {
                let processor = self.clone();
                let progress = progress.clone();
                async move {
                    if let Some(name) = path.file_name() {
                        progress.set_message(format!("Processing: {}", name.to_string_lossy()));
                    }
                    let result = processor.run_blocking(&path).await;
                    progress.inc(1);
                    (path, result)
                }
            })
            .buffered(workers)
            .collect()
            .await;

        progress.finish_with_message("All SPED files processed");

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) if self.config.strict_mode => {
                    error!("Failed to process {}: {}", path.display(), e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    failures.push(FileFailure {
                        path,
                        category: e.category().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        merge_outputs(outputs, failures, self.config.max_warnings)
    }

    /// `buffered(workers)` in `process_files` bounds how many of these run
    async fn run_blocking(&self, path: &Path) -> Result<FileOutput> {
        let processor = self.clone();
        let task_path = path.to_path_buf();
        task::spawn_blocking(move || processor.process_file(&task_path))
            .await
            .map_err(|e| SpedError::file(path, format!("Worker task failed: {}", e)))?
    }

    /// Compare document totals against the sum of their items for one file.
    ///
    /// Checks C100 `VL_MERC` against C170 `VL_ITEM` using the configured
    /// tolerance. Relationship indices are per file, so this takes a single
    /// file's raw tables rather than a batch.
    pub fn document_total_divergences(&self, tables: &FrameSet) -> Result<Vec<TotalDivergence>> {
        let (Some(documents), Some(items)) = (tables.get("C100"), tables.get("C170")) else {
            return Ok(Vec::new());
        };
        let divergences = cross_reference_totals(
            documents,
            items,
            "C100_INDEX",
            "VL_MERC",
            "VL_ITEM",
            self.config.validation_tolerance,
        )?;
        if !divergences.is_empty() {
            warn!(
                "{} documents have item totals diverging from VL_MERC",
                divergences.len()
            );
        }
        Ok(divergences)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    fn check_required_fields(
        &self,
        tables: &FrameSet,
        metrics: &mut ProcessingMetrics,
    ) -> Result<()> {
        for (code, df) in tables {
            let required = default_required_fields(code);
            if required.is_empty() || df.height() == 0 {
                continue;
            }
            let missing = missing_required_fields(df, required)?;
            if missing.is_empty() {
                continue;
            }

            let fields: BTreeSet<&str> = missing.iter().map(|m| m.field.as_str()).collect();
            let rows: BTreeSet<usize> = missing.iter().map(|m| m.row).collect();
            let warning = format!(
                "{}: {} rows with empty required fields ({})",
                code,
                rows.len(),
                fields.into_iter().collect::<Vec<_>>().join(", ")
            );
            warn!("{}", warning);
            metrics.record_error_category("Validation Error");
            metrics.add_warning(warning);
        }
        Ok(())
    }
}

/// Concatenate per-file outputs in order
fn merge_outputs(
    outputs: Vec<FileOutput>,
    failures: Vec<FileFailure>,
    max_warnings: usize,
) -> Result<BatchOutput> {
    let mut metrics = ProcessingMetrics::with_warning_cap("batch", max_warnings);
    for output in &outputs {
        metrics.merge(&output.metrics);
    }
    for failure in &failures {
        metrics.record_error_category(&failure.category);
        metrics.add_warning(format!("{}: {}", failure.path.display(), failure.message));
    }
    if outputs.is_empty() {
        metrics.finish();
    }

    let tables = concat_frame_sets(outputs.iter().map(|o| &o.tables))?;
    let consolidated = concat_frame_sets(outputs.iter().map(|o| &o.consolidated))?;
    let file_metrics = outputs.into_iter().map(|o| o.metrics).collect();

    Ok(BatchOutput {
        tables,
        consolidated,
        metrics,
        file_metrics,
        failures,
    })
}

#[cfg(test)]
mod tests;
