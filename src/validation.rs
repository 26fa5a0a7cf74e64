//! Structural checks on converted frames
//!
//! Checks return reports by default. The `check_*`/`enforce_*` variants
//! turn the first offence into an error for callers that want to stop.

use crate::constants::RECORD_CODE_FIELD;
use crate::error::{Result, SpedError};
use crate::frame::{Placement, has_column, ordered_left_join};
use polars::prelude::{Column, DataFrame, DataType, IntoLazy, col};
use serde::Serialize;

/// Required fields per record code
pub fn default_required_fields(code: &str) -> &'static [&'static str] {
    const DOCUMENT: &[&str] = &["IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "NUM_DOC", "DT_DOC"];
    match code {
        "C100" | "D100" | "D500" | "D700" => DOCUMENT,
        "C170" => &["NUM_ITEM", "COD_ITEM", "QTD", "VL_ITEM"],
        "A100" => &["IND_OPER", "IND_EMIT", "COD_PART", "NUM_DOC", "DT_DOC"],
        "F100" => &["IND_OPER", "COD_PART", "DT_OPER"],
        "C500" => &["COD_PART", "COD_MOD", "NUM_DOC", "DT_DOC"],
        _ => &[],
    }
}

/// A required field left empty on one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub row: usize,
    pub field: String,
}

/// Rows whose required fields are empty; absent columns count as empty.
///
/// Text is empty when null or blank after trimming; other columns only when
/// null.
pub fn missing_required_fields(df: &DataFrame, fields: &[&str]) -> Result<Vec<MissingField>> {
    let mut masks: Vec<(&str, Vec<bool>)> = Vec::with_capacity(fields.len());
    for &field in fields {
        let mask = match df.column(field) {
            Err(_) => vec![true; df.height()],
            Ok(column) if column.dtype() == &DataType::String => column
                .str()?
                .into_iter()
                .map(|value| value.is_none_or(|text| text.trim().is_empty()))
                .collect(),
            Ok(column) => {
                let nulls = column.is_null();
                nulls.into_iter().map(|null| null.unwrap_or(true)).collect()
            }
        };
        masks.push((field, mask));
    }

    let mut missing = Vec::new();
    for row in 0..df.height() {
        for (field, mask) in &masks {
            if mask[row] {
                missing.push(MissingField {
                    row,
                    field: field.to_string(),
                });
            }
        }
    }
    Ok(missing)
}

/// Report missing required fields of `record`, or fail on the first one
/// when `strict`
pub fn check_required_fields(
    df: &DataFrame,
    record: &str,
    fields: &[&str],
    strict: bool,
) -> Result<Vec<MissingField>> {
    let missing = missing_required_fields(df, fields)?;
    if strict {
        if let Some(first) = missing.first() {
            return Err(SpedError::Validation {
                message: format!("Required field is empty on row {}", first.row + 1),
                record: Some(record.to_string()),
                field: Some(first.field.clone()),
                value: df
                    .column(&first.field)
                    .ok()
                    .and_then(|column| column.str().ok()?.get(first.row).map(str::to_string)),
            });
        }
    }
    Ok(missing)
}

/// A parent whose total disagrees with the sum of its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalDivergence {
    /// Relationship index shared by the parent and its children
    pub index: String,
    pub parent_total: f64,
    pub child_total: f64,
    pub difference: f64,
    pub parent_record: String,
    pub document_number: String,
}

const SUM_PREFIX: &str = "__sum";

/// Compare each parent total with the sum of its children's values.
///
/// Children are summed per index with a polars group-by and joined back onto
/// the parent rows. Parents with a null total are skipped and parents
/// without children sum to zero. Returns nothing when either frame is empty
/// or lacks the named columns.
pub fn cross_reference_totals(
    parent: &DataFrame,
    child: &DataFrame,
    parent_index: &str,
    parent_total: &str,
    child_value: &str,
    tolerance: f64,
) -> Result<Vec<TotalDivergence>> {
    if parent.height() == 0 || child.height() == 0 {
        return Ok(Vec::new());
    }
    let required = [
        (parent, parent_index),
        (parent, parent_total),
        (child, parent_index),
        (child, child_value),
    ];
    if required.iter().any(|(df, name)| !has_column(df, name)) {
        return Ok(Vec::new());
    }

    let sums = child
        .clone()
        .lazy()
        .group_by([col(parent_index)])
        .agg([col(child_value)
            .cast(DataType::Float64)
            .sum()])
        .collect()?;
    let joined = ordered_left_join(parent, &sums, parent_index, SUM_PREFIX, Placement::Append)?;
    let child_totals = joined
        .column(&format!("{}_{}", SUM_PREFIX, child_value))?
        .f64()?;

    let keys = text_column(&joined, parent_index)?;
    let keys = keys.str()?;
    let totals = joined.column(parent_total)?.cast(&DataType::Float64)?;
    let totals = totals.f64()?;
    let records = optional_text_column(&joined, RECORD_CODE_FIELD)?;
    let documents = optional_text_column(&joined, "NUM_DOC")?;

    let mut divergences = Vec::new();
    for row in 0..joined.height() {
        let (Some(total), Some(key)) = (totals.get(row), keys.get(row)) else {
            continue;
        };
        let child_total = child_totals.get(row).unwrap_or(0.0);
        let difference = (total - child_total).abs();
        if difference > tolerance {
            divergences.push(TotalDivergence {
                index: key.to_string(),
                parent_total: total,
                child_total,
                difference,
                parent_record: text_at(records.as_ref(), row)?,
                document_number: text_at(documents.as_ref(), row)?,
            });
        }
    }
    Ok(divergences)
}

fn text_column(df: &DataFrame, name: &str) -> Result<Column> {
    Ok(df.column(name)?.cast(&DataType::String)?)
}

fn optional_text_column(df: &DataFrame, name: &str) -> Result<Option<Column>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    text_column(df, name).map(Some)
}

fn text_at(column: Option<&Column>, row: usize) -> Result<String> {
    let text = match column {
        Some(column) => column.str()?.get(row).unwrap_or("").to_string(),
        None => "Unknown".to_string(),
    };
    Ok(text)
}

/// Fail with an integrity error on the first divergent parent
pub fn enforce_cross_reference_totals(
    parent: (&str, &DataFrame),
    child: (&str, &DataFrame),
    parent_index: &str,
    parent_total: &str,
    child_value: &str,
    tolerance: f64,
) -> Result<()> {
    let divergences = cross_reference_totals(
        parent.1,
        child.1,
        parent_index,
        parent_total,
        child_value,
        tolerance,
    )?;
    match divergences.first() {
        None => Ok(()),
        Some(first) => Err(SpedError::Integrity {
            message: format!(
                "{} of document {} is {:.2} but {} sums to {:.2} ({} divergent parents)",
                parent_total,
                first.document_number,
                first.parent_total,
                child_value,
                first.child_total,
                divergences.len()
            ),
            parent: parent.0.to_string(),
            child: child.0.to_string(),
        }),
    }
}
