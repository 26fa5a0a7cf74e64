//! Derived date columns for date-bearing record fields

use crate::table::{ColumnKind, Table, Value};
use chrono::NaiveDate;

/// Textual layout of a date field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `20240131`
    YearMonthDay,
    /// `31012024`
    DayMonthYear,
    /// `012024` (leading zero optional), read as the first of the month
    MonthYear,
}

impl DateFormat {
    /// Parse a raw field; blanks and malformed input yield `None`
    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        match self {
            Self::YearMonthDay => NaiveDate::parse_from_str(raw, "%Y%m%d").ok(),
            Self::DayMonthYear => NaiveDate::parse_from_str(raw, "%d%m%Y").ok(),
            Self::MonthYear => {
                if raw.len() > 6 {
                    return None;
                }
                let padded = format!("{:0>6}01", raw);
                NaiveDate::parse_from_str(&padded, "%m%Y%d").ok()
            }
        }
    }
}

/// Source field and format for one derived `<FIELD>_DATE` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRule {
    pub field: &'static str,
    pub format: DateFormat,
}

impl DateRule {
    const fn new(field: &'static str, format: DateFormat) -> Self {
        Self { field, format }
    }

    pub fn target_column(&self) -> String {
        format!("{}_DATE", self.field)
    }
}

/// Date rules per record code
pub fn date_rules(code: &str) -> &'static [DateRule] {
    use DateFormat::*;
    const C100: &[DateRule] = &[
        DateRule::new("DT_DOC", YearMonthDay),
        DateRule::new("DT_E_S", YearMonthDay),
    ];
    const D100: &[DateRule] = &[
        DateRule::new("DT_DOC", DayMonthYear),
        DateRule::new("DT_A_P", DayMonthYear),
    ];
    const A100: &[DateRule] = &[
        DateRule::new("DT_DOC", YearMonthDay),
        DateRule::new("DT_EXE_SERV", YearMonthDay),
    ];
    const E100: &[DateRule] = &[
        DateRule::new("DT_INI", YearMonthDay),
        DateRule::new("DT_FIN", YearMonthDay),
    ];
    const E113: &[DateRule] = &[DateRule::new("DT_DOC", YearMonthDay)];
    const E116: &[DateRule] = &[
        DateRule::new("DT_VCTO", YearMonthDay),
        DateRule::new("MES_REF", MonthYear),
    ];
    const C500: &[DateRule] = &[
        DateRule::new("DT_DOC", YearMonthDay),
        DateRule::new("DT_ENT", YearMonthDay),
    ];
    const D500: &[DateRule] = &[
        DateRule::new("DT_DOC", YearMonthDay),
        DateRule::new("DT_A_P", YearMonthDay),
    ];

    match code {
        "C100" | "D700" => C100,
        "D100" => D100,
        "A100" => A100,
        "E100" => E100,
        "E113" => E113,
        "E116" => E116,
        "C500" => C500,
        "D500" => D500,
        _ => &[],
    }
}

/// Append one `<FIELD>_DATE` column per rule whose field is present
pub fn apply_date_rules(table: &mut Table, rules: &[DateRule]) {
    for rule in rules {
        let Some(values) = table.column(rule.field) else {
            continue;
        };
        let dates: Vec<Value> = values
            .map(|value| match value {
                Value::Text(raw) => Value::from(rule.format.parse(raw)),
                _ => Value::Null,
            })
            .collect();
        table.add_column(rule.target_column(), ColumnKind::Date, dates);
    }
}
