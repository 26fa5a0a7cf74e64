//! SPED Consolidator Library
//!
//! Parses pipe-delimited SPED/EFD bookkeeping files into one table per
//! record code, tracks parent/child relationships while reading, and
//! consolidates each configured hierarchy into a single flat table.
//!
//! This library provides tools for:
//! - Tokenizing `|`-delimited record lines and padding them to their layout
//! - Deriving relationship indices from a declarative schema of groups
//! - Converting Brazilian-locale numbers and enriching indicator and date fields
//! - Turning enriched tables into polars DataFrames
//! - Left-joining children and headers onto parent records per group
//! - Structural validation and cross-checks of document totals
//! - Concurrent batch processing with per-file metrics
//! - Exporting consolidated frames to Parquet files

pub mod cli;
pub mod config;
pub mod consolidate;
pub mod constants;
pub mod convert;
pub mod error;
pub mod export;
pub mod frame;
pub mod intake;
pub mod metrics;
pub mod parser;
pub mod processor;
pub mod schema;
pub mod table;
pub mod validation;

// Re-export commonly used types
pub use config::SpedConfig;
pub use error::{Result, SpedError};
pub use frame::FrameSet;
pub use metrics::ProcessingMetrics;
pub use processor::{BatchOutput, FileFailure, FileOutput, SpedProcessor};
pub use schema::{ConsolidationGroup, RecordLayout, SpedSchema};
pub use table::{Table, TableSet, Value};
