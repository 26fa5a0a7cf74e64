//! Post-parse conversion and enrichment of raw tables
//!
//! Runs after a pass has finished: numeric fields become numbers, then
//! indicator codes are labelled and derived date columns are appended.
//! Nothing here fails the pass; bad values become nulls.

pub mod dates;
pub mod indicators;
pub mod numeric;

pub use dates::{DateFormat, DateRule, apply_date_rules, date_rules};
pub use indicators::{
    EmitterIndicator, FreightIndicator, IndicatorField, OperationIndicator,
    apply_indicator_labels, indicator_fields,
};
pub use numeric::{LocaleNumberConverter, parse_locale_number};

use crate::metrics::ProcessingMetrics;
use crate::schema::LayoutRegistry;
use crate::table::TableSet;
use tracing::debug;

/// Convert the numeric fields of every table and record failures
pub fn convert_tables(
    tables: &mut TableSet,
    layouts: &LayoutRegistry,
    metrics: &mut ProcessingMetrics,
) {
    let mut converter = LocaleNumberConverter::new();
    for (code, table) in tables.iter_mut() {
        let Some(layout) = layouts.get(code) else {
            continue;
        };
        if table.is_empty() || layout.numeric_fields.is_empty() {
            continue;
        }
        let before = converter.failures();
        converter.convert_table(table, layout);
        let failed = converter.failures() - before;
        if failed > 0 {
            debug!("{}: {} numeric values could not be converted", code, failed);
        }
    }
    metrics.add_conversion_failures(converter.failures());
}

/// Apply indicator labels and derived date columns
pub fn enrich_tables(tables: &mut TableSet) {
    for (code, table) in tables.iter_mut() {
        apply_indicator_labels(table, indicator_fields(code));
        apply_date_rules(table, date_rules(code));
    }
}
