//! Row buffers filled during a parsing pass
//!
//! Tables keep their rows in file order. Cells are typed so that numeric
//! conversion and date enrichment can work on the same data without
//! re-parsing text. Once enrichment is done each table becomes a polars
//! DataFrame (see [`crate::frame`]).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Integer(integer) => Some(*integer as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    /// True for nulls and text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{}", number),
            Value::Integer(integer) => write!(f, "{}", integer),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(integer: i64) -> Self {
        Value::Integer(integer)
    }
}

impl From<Option<f64>> for Value {
    fn from(number: Option<f64>) -> Self {
        number.map_or(Value::Null, Value::Number)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(Value::Null, Value::Date)
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Integer,
    Date,
}

/// Named, ordered columns with row-major cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,

    /// Kinds fixed by the pipeline; they win over inference so the same
    /// column has the same dtype in every file
    #[serde(skip)]
    kinds: HashMap<String, ColumnKind>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            kinds: HashMap::new(),
        }
    }

    /// Table with no columns and no rows
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row, padding with nulls or truncating to the table width
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
        let index = self.column_index(name)?;
        self.rows.get(row).map(|cells| &cells[index])
    }

    /// Append a column of a known kind; `values` shorter than the table are
    /// null-filled
    pub fn add_column(&mut self, name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) {
        let name = name.into();
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or(Value::Null));
        }
        self.kinds.insert(name.clone(), kind);
        self.columns.push(name);
    }

    /// Fix the kind of an existing column
    pub fn declare_kind(&mut self, name: &str, kind: ColumnKind) {
        if self.has_column(name) {
            self.kinds.insert(name.to_string(), kind);
        }
    }

    /// Declared kind of a column, else the kind of its non-null cells.
    /// `None` when the column is absent or undeclared and all null.
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        if let Some(kind) = self.kinds.get(name) {
            return self.has_column(name).then_some(*kind);
        }

        let mut kind = None;
        for value in self.column(name)? {
            let current = match value {
                Value::Null => continue,
                Value::Text(_) => ColumnKind::Text,
                Value::Number(_) => ColumnKind::Number,
                Value::Integer(_) => ColumnKind::Integer,
                Value::Date(_) => ColumnKind::Date,
            };
            kind = match kind {
                None => Some(current),
                Some(existing) if existing == current => Some(existing),
                Some(_) => return Some(ColumnKind::Text),
            };
        }
        kind
    }
}

/// Tables keyed by record code or group name, in key order
pub type TableSet = BTreeMap<String, Table>;
