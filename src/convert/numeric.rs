//! Locale number conversion (`1.234,56` -> `1234.56`)

use crate::constants::{DECIMAL_SEPARATOR, GROUPING_SEPARATOR};
use crate::schema::RecordLayout;
use crate::table::{ColumnKind, Table, Value};
use tracing::debug;

/// Converts Brazilian-formatted numbers and counts the values it rejects
#[derive(Debug, Default)]
pub struct LocaleNumberConverter {
    failures: usize,
}

impl LocaleNumberConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one raw field.
    ///
    /// Blank input is a missing value, not a failure. Anything that does not
    /// parse after removing grouping dots and swapping the decimal comma is
    /// counted as a failure and yields `None`.
    pub fn convert(&mut self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != GROUPING_SEPARATOR)
            .map(|c| if c == DECIMAL_SEPARATOR { '.' } else { c })
            .collect();

        match normalized.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                debug!("Could not convert '{}' to a number", raw);
                self.failures += 1;
                None
            }
        }
    }

    /// Convert every numeric field of `layout` in place
    pub fn convert_table(&mut self, table: &mut Table, layout: &RecordLayout) {
        let indices: Vec<usize> = layout
            .numeric_fields
            .iter()
            .filter_map(|field| table.column_index(field))
            .collect();
        for field in &layout.numeric_fields {
            table.declare_kind(field, ColumnKind::Number);
        }

        for row in &mut table.rows {
            for &index in &indices {
                let converted = match &row[index] {
                    Value::Text(raw) => Value::from(self.convert(raw)),
                    Value::Null => Value::Null,
                    other => other.clone(),
                };
                row[index] = converted;
            }
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

/// Convert a single value without tracking failures
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    LocaleNumberConverter::new().convert(raw)
}
