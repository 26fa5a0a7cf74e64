//! Per-pass accumulation of index-augmented rows

use crate::error::{Result, SpedError};
use crate::metrics::ProcessingMetrics;
use crate::parser::indexer::{IndexPlan, RelationshipCounters};
use crate::parser::tokenizer::{is_record_line, record_code, tokenize_line};
use crate::schema::LayoutRegistry;
use crate::table::{ColumnKind, Table, TableSet, Value};
use tracing::{debug, warn};

/// Tables and metrics produced by one parsing pass
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// Raw tables keyed by record code, one per layout
    pub tables: TableSet,
    pub metrics: ProcessingMetrics,
}

/// Mutable state of one sequential pass over a file.
///
/// Lines must be fed in file order: relationship counters advance with
/// every row and child rows pick up the latest parent value.
pub struct RecordAccumulator<'a> {
    layouts: &'a LayoutRegistry,
    plan: &'a IndexPlan,
    strict: bool,
    counters: RelationshipCounters,
    tables: TableSet,
    metrics: ProcessingMetrics,
}

impl<'a> RecordAccumulator<'a> {
    pub fn new(
        layouts: &'a LayoutRegistry,
        plan: &'a IndexPlan,
        strict: bool,
        metrics: ProcessingMetrics,
    ) -> Self {
        let tables = layouts
            .iter()
            .map(|layout| {
                let mut columns = layout.fields.clone();
                columns.extend(plan.index_columns(&layout.code).map(str::to_string));
                let mut table = Table::new(layout.code.clone(), columns);
                for index in plan.index_columns(&layout.code) {
                    table.declare_kind(index, ColumnKind::Integer);
                }
                (layout.code.clone(), table)
            })
            .collect();

        Self {
            layouts,
            plan,
            strict,
            counters: RelationshipCounters::new(),
            tables,
            metrics,
        }
    }

    /// Feed one line (1-based `line_number`).
    ///
    /// In lenient mode malformed lines are logged, counted and skipped. In
    /// strict mode the error is returned and the failing line is left out of
    /// the metrics.
    pub fn feed_line(&mut self, line_number: usize, line: &str) -> Result<()> {
        if !is_record_line(line) {
            self.metrics.record_skipped();
            return Ok(());
        }

        match self.accept(line_number, line) {
            Ok(()) => Ok(()),
            Err(error) if self.strict => Err(error),
            Err(error) => {
                warn!("Skipping line {}: {}", line_number, error);
                self.metrics.record_error(error.category());
                self.metrics.add_warning(error.to_string());
                Ok(())
            }
        }
    }

    fn accept(&mut self, line_number: usize, line: &str) -> Result<()> {
        let code = record_code(line_number, line)?;

        let Some(layout) = self.layouts.get(code) else {
            self.metrics.record_unknown(code);
            return Ok(());
        };

        let actions = self.plan.actions(code);
        let mut row: Vec<Value> = Vec::with_capacity(layout.field_count() + actions.len());
        row.extend(
            tokenize_line(line)
                .into_iter()
                .take(layout.field_count())
                .map(Value::from),
        );
        row.resize(layout.field_count(), Value::from(""));
        row.extend(self.counters.apply(actions).into_iter().map(Value::Integer));

        let table = self.tables.get_mut(code).ok_or_else(|| {
            SpedError::parse(line_number, format!("No table allocated for {}", code), line)
        })?;
        table.rows.push(row);
        self.metrics.record_line(code);
        Ok(())
    }

    pub fn metrics(&self) -> &ProcessingMetrics {
        &self.metrics
    }

    /// Close the pass and hand over the tables
    pub fn finish(mut self) -> ParseOutput {
        self.metrics.finish();
        for (code, table) in &self.tables {
            if !table.is_empty() {
                debug!("{}: {} rows", code, table.height());
            }
        }
        ParseOutput {
            tables: self.tables,
            metrics: self.metrics,
        }
    }
}
