//! Polars frames built from enriched tables
//!
//! Everything after enrichment works on DataFrames: consolidation joins,
//! validation aggregates, batch concatenation and Parquet export.

use crate::constants::RECORD_CODE_FIELD;
use crate::error::Result;
use crate::table::{ColumnKind, Table, TableSet, Value};

use chrono::Datelike;
use polars::prelude::{
    Column, DataFrame, DataType, Expr, IntoLazy, JoinArgs, JoinType, LazyFrame, NamedFrom,
    SortMultipleOptions, UnionArgs, col, concat_lf_diagonal,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const LEFT_ROW: &str = "__left_row";
const RIGHT_ROW: &str = "__right_row";

/// Frames keyed by record code or group name, in key order
pub type FrameSet = BTreeMap<String, DataFrame>;

/// Where joined columns are placed relative to the existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    Prepend,
}

/// Convert a table into a DataFrame.
///
/// Number columns become Float64, index columns Int64, date columns Date and
/// everything else String. Undeclared columns mixing kinds become text.
pub fn table_to_frame(table: &Table) -> Result<DataFrame> {
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let kind = table.column_kind(name).unwrap_or(ColumnKind::Text);
            let cells = table.rows.iter().map(move |row| &row[index]);
            build_column(name, kind, cells)
        })
        .collect::<Result<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Convert every table of a pass
pub fn tables_to_frames(tables: &TableSet) -> Result<FrameSet> {
    tables
        .iter()
        .map(|(code, table)| Ok((code.clone(), table_to_frame(table)?)))
        .collect()
}

fn build_column<'a>(
    name: &str,
    kind: ColumnKind,
    cells: impl Iterator<Item = &'a Value>,
) -> Result<Column> {
    let column = match kind {
        ColumnKind::Number => {
            let values: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
            Column::new(name.into(), values)
        }
        ColumnKind::Integer => {
            let values: Vec<Option<i64>> = cells.map(Value::as_i64).collect();
            Column::new(name.into(), values)
        }
        ColumnKind::Date => {
            let values: Vec<Option<i32>> = cells
                .map(|value| match value {
                    Value::Date(date) => Some(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values).cast(&DataType::Date)?
        }
        ColumnKind::Text => {
            let values: Vec<Option<String>> = cells
                .map(|value| (!value.is_null()).then(|| value.to_string()))
                .collect();
            Column::new(name.into(), values)
        }
    };
    Ok(column)
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Keep only the listed columns that exist, in frame order
pub fn drop_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let kept: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| !names.contains(&name.as_str()))
        .collect();
    if kept.len() == df.width() {
        return Ok(df.clone());
    }
    Ok(df.select(kept)?)
}

/// Left join `right` onto `left` on `key`, keeping row order.
///
/// Right columns other than REG and the key are renamed `<prefix>_<name>`.
/// Each left row appears once per matching right row, in right row order,
/// or once with nulls when nothing matches. Null keys never match.
pub fn ordered_left_join(
    left: &DataFrame,
    right: &DataFrame,
    key: &str,
    prefix: &str,
    placement: Placement,
) -> Result<DataFrame> {
    let taken: Vec<String> = column_names(right)
        .into_iter()
        .filter(|name| name != RECORD_CODE_FIELD && name != key)
        .collect();
    let renamed: Vec<String> = taken
        .iter()
        .map(|name| format!("{}_{}", prefix, name))
        .collect();

    let mut right_exprs = vec![col(key)];
    right_exprs.extend(
        taken
            .iter()
            .zip(&renamed)
            .map(|(name, alias)| col(name.as_str()).alias(alias.as_str())),
    );
    right_exprs.push(col(RIGHT_ROW));
    let right = right
        .clone()
        .lazy()
        .with_row_index(RIGHT_ROW, None)
        .select(right_exprs);

    let left_columns = column_names(left);
    let output: Vec<Expr> = match placement {
        Placement::Append => left_columns.iter().chain(&renamed).collect::<Vec<_>>(),
        Placement::Prepend => renamed.iter().chain(&left_columns).collect::<Vec<_>>(),
    }
    .into_iter()
    .map(|name| col(name.as_str()))
    .collect();

    let joined = left
        .clone()
        .lazy()
        .with_row_index(LEFT_ROW, None)
        .join(right, [col(key)], [col(key)], JoinArgs::new(JoinType::Left))
        .sort_by_exprs([col(LEFT_ROW), col(RIGHT_ROW)], SortMultipleOptions::default())
        .select(output)
        .collect()?;

    debug!(
        "Joined {} onto {} rows: {} rows",
        prefix,
        left.height(),
        joined.height()
    );
    Ok(joined)
}

/// Stack frames vertically in the given order.
///
/// Columns are the union of all inputs in first-seen order and cells a
/// frame does not have are null. Frames without rows contribute nothing.
pub fn concat_diagonal<'a>(frames: impl IntoIterator<Item = &'a DataFrame>) -> Result<DataFrame> {
    let lazy_frames: Vec<LazyFrame> = frames
        .into_iter()
        .filter(|df| df.height() > 0)
        .map(|df| df.clone().lazy())
        .collect();
    if lazy_frames.is_empty() {
        return Ok(DataFrame::empty());
    }

    debug!("Concatenating {} frames", lazy_frames.len());
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    Ok(concat_lf_diagonal(lazy_frames, args)?.collect()?)
}

/// Concatenate frame sets key by key, in set order
pub fn concat_frame_sets<'a>(
    sets: impl Iterator<Item = &'a FrameSet> + Clone,
) -> Result<FrameSet> {
    let keys: BTreeSet<&String> = sets.clone().flat_map(|set| set.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let merged = concat_diagonal(sets.clone().filter_map(|set| set.get(key)))?;
            Ok((key.clone(), merged))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        let mut table = Table::new(
            "C",
            vec![
                "NUM_DOC".into(),
                "VL_DOC".into(),
                "C100_INDEX".into(),
                "DT_DOC_DATE".into(),
                "EMPTY".into(),
            ],
        );
        table.push_row(vec![
            "1".into(),
            Value::Number(10.5),
            Value::Integer(0),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            Value::Null,
        ]);
        table.push_row(vec![
            "2".into(),
            Value::Null,
            Value::Integer(1),
            Value::Null,
            Value::Null,
        ]);
        table
    }

    fn frame(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> DataFrame {
        let mut table = Table::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table_to_frame(&table).unwrap()
    }

    fn texts(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_frame_dtypes() {
        let df = table_to_frame(&sample()).unwrap();
        assert_eq!(df.shape(), (2, 5));
        assert_eq!(df.column("NUM_DOC").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("VL_DOC").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("C100_INDEX").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("DT_DOC_DATE").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("EMPTY").unwrap().null_count(), 2);

        let dates = df.column("DT_DOC_DATE").unwrap().cast(&DataType::String).unwrap();
        assert_eq!(dates.str().unwrap().get(0), Some("2024-01-31"));
    }

    #[test]
    fn test_epoch_offset() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch.num_days_from_ce(), UNIX_EPOCH_DAYS_FROM_CE);
    }

    #[test]
    fn test_declared_kind_survives_all_null_column() {
        let mut table = Table::new("C170", vec!["VL_ITEM".into()]);
        table.push_row(vec![Value::Null]);
        table.declare_kind("VL_ITEM", ColumnKind::Number);
        let df = table_to_frame(&table).unwrap();
        assert_eq!(df.column("VL_ITEM").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_ordered_left_join_keeps_order_and_pads() {
        let left = frame(
            "C100",
            &["REG", "NUM_DOC", "K"],
            vec![
                vec!["C100".into(), "b".into(), Value::Integer(1)],
                vec!["C100".into(), "a".into(), Value::Integer(0)],
                vec!["C100".into(), "c".into(), Value::Null],
            ],
        );
        let right = frame(
            "C170",
            &["REG", "ITEM", "K"],
            vec![
                vec!["C170".into(), "z".into(), Value::Integer(0)],
                vec!["C170".into(), "y".into(), Value::Integer(1)],
                vec!["C170".into(), "x".into(), Value::Integer(1)],
                vec!["C170".into(), "n".into(), Value::Null],
            ],
        );

        let joined = ordered_left_join(&left, &right, "K", "C170", Placement::Append).unwrap();
        assert_eq!(column_names(&joined), vec!["REG", "NUM_DOC", "K", "C170_ITEM"]);
        assert_eq!(
            texts(&joined, "NUM_DOC"),
            vec![Some("b".into()), Some("b".into()), Some("a".into()), Some("c".into())]
        );
        assert_eq!(
            texts(&joined, "C170_ITEM"),
            vec![Some("y".into()), Some("x".into()), Some("z".into()), None]
        );

        let headed = ordered_left_join(&left, &right, "K", "C170", Placement::Prepend).unwrap();
        assert_eq!(column_names(&headed), vec!["C170_ITEM", "REG", "NUM_DOC", "K"]);
    }

    #[test]
    fn test_concat_diagonal_unions_columns() {
        let first = table_to_frame(&sample()).unwrap();
        let second = frame("C", &["NUM_DOC", "EXTRA"], vec![vec!["3".into(), "x".into()]]);
        let empty = frame("C", &["IGNORED"], vec![]);

        let merged = concat_diagonal([&first, &empty, &second]).unwrap();
        assert_eq!(
            column_names(&merged),
            vec!["NUM_DOC", "VL_DOC", "C100_INDEX", "DT_DOC_DATE", "EMPTY", "EXTRA"]
        );
        assert_eq!(merged.height(), 3);
        assert_eq!(merged.column("VL_DOC").unwrap().dtype(), &DataType::Float64);
        assert_eq!(merged.column("VL_DOC").unwrap().f64().unwrap().get(2), None);
        assert_eq!(
            texts(&merged, "EXTRA"),
            vec![None, None, Some("x".into())]
        );

        assert_eq!(concat_diagonal([&empty]).unwrap().height(), 0);
    }

    #[test]
    fn test_concat_frame_sets_by_key() {
        let first: FrameSet = [("C".to_string(), table_to_frame(&sample()).unwrap())].into();
        let second: FrameSet = [
            ("C".to_string(), table_to_frame(&sample()).unwrap()),
            ("D".to_string(), frame("D", &["NUM_DOC"], vec![vec!["9".into()]])),
        ]
        .into();

        let merged = concat_frame_sets([&first, &second].into_iter()).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["C"].height(), 4);
        assert_eq!(merged["D"].height(), 1);
    }

    #[test]
    fn test_drop_columns_keeps_order() {
        let df = table_to_frame(&sample()).unwrap();
        let dropped = drop_columns(&df, &["C100_INDEX", "MISSING"]).unwrap();
        assert_eq!(
            column_names(&dropped),
            vec!["NUM_DOC", "VL_DOC", "DT_DOC_DATE", "EMPTY"]
        );
    }
}
