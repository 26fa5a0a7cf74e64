//! Line-oriented parser for SPED files
//!
//! Parsing is a single sequential pass: each line is tokenized, resolved to
//! its layout, padded to the layout width and extended with relationship
//! indices before being appended to the table of its record code.

pub mod accumulator;
pub mod indexer;
pub mod tokenizer;

pub use accumulator::{ParseOutput, RecordAccumulator};
pub use indexer::{IndexAction, IndexActionKind, IndexPlan, RelationshipCounters};
pub use tokenizer::{record_code, tokenize_line};

use crate::config::SpedConfig;
use crate::error::Result;
use crate::metrics::ProcessingMetrics;
use crate::schema::LayoutRegistry;
use std::sync::Arc;

/// Parser bound to a schema; cheap to clone and share across tasks
#[derive(Debug, Clone)]
pub struct SpedParser {
    layouts: Arc<LayoutRegistry>,
    plan: Arc<IndexPlan>,
    strict: bool,
    max_warnings: usize,
}

impl SpedParser {
    pub fn new(layouts: Arc<LayoutRegistry>, plan: Arc<IndexPlan>, config: &SpedConfig) -> Self {
        Self {
            layouts,
            plan,
            strict: config.strict_mode,
            max_warnings: config.max_warnings,
        }
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    pub fn plan(&self) -> &IndexPlan {
        &self.plan
    }

    /// Start a pass with fresh counters and empty tables
    pub fn begin_pass(&self, source: impl Into<String>) -> RecordAccumulator<'_> {
        RecordAccumulator::new(
            &self.layouts,
            &self.plan,
            self.strict,
            ProcessingMetrics::with_warning_cap(source, self.max_warnings),
        )
    }

    /// Parse decoded file contents
    pub fn parse_str(&self, source: impl Into<String>, text: &str) -> Result<ParseOutput> {
        let mut pass = self.begin_pass(source);
        for (index, line) in text.lines().enumerate() {
            pass.feed_line(index + 1, line)?;
        }
        Ok(pass.finish())
    }
}
