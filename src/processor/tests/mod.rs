//! Tests for the processing pipeline
//!
//! Fixtures are small hand-written SPED files covering blocks C and E.

pub mod multi_file;

use crate::config::SpedConfig;
use crate::processor::SpedProcessor;
use crate::schema::SpedSchema;
use polars::prelude::{DataFrame, DataType};

/// A C block with two documents (the first with two items and one
/// analytical record) followed by an E block with one obligation.
pub fn sample_sped() -> String {
    [
        "|0000|017|0|01012024|31012024|EMPRESA TESTE|",
        "|C001|0|",
        "|C010|12345678000199|0|",
        "|C100|0|1|PART1|55|00|1|100|KEY1|20240101|20240102|1.500,00|0|0,00|0,00|1.500,00|9|",
        "|C170|1|ITEM1|Parafuso|2,000|UN|1.000,00|",
        "|C170|2|ITEM2||1|UN|500,00|",
        "|C190|000|5102|18,00|1.500,00|1.500,00|270,00|",
        "|C100|1|0|PART2|55|00|1|101|KEY2|20240105|20240105|200,00|0|0,00|0,00|200,00|0|",
        "|E100|20240101|20240131|",
        "|E110|270,00|0,00|",
        "|E116|000|270,00|20240210|1234|||||012024|",
        "|9999|12|",
    ]
    .join("\r\n")
        + "\r\n"
}

pub fn processor(config: SpedConfig) -> SpedProcessor {
    SpedProcessor::new(SpedSchema::default(), config).unwrap()
}

pub fn text(df: &DataFrame, column: &str, row: usize) -> Option<String> {
    let values = df.column(column).unwrap().cast(&DataType::String).unwrap();
    values.str().unwrap().get(row).map(str::to_string)
}

pub fn number(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

pub fn integer(df: &DataFrame, column: &str, row: usize) -> Option<i64> {
    df.column(column).unwrap().i64().unwrap().get(row)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    crate::frame::column_names(df)
}
