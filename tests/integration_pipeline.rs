//! Integration tests for the SPED pipeline through the public API
//!
//! Fixtures are written to temporary directories so the whole path from
//! intake to Parquet export is exercised.

use polars::prelude::{DataFrame, DataType, ParquetReader, SerReader};
use sped_consolidator::cli::{collect_inputs, write_outputs};
use sped_consolidator::frame::column_names;
use sped_consolidator::{SpedConfig, SpedError, SpedProcessor, SpedSchema};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const D_BLOCK: &str = "\
|D001|0|
|D010|12345678000199|
|D100|1|0|PART9|57|00|1||900|CTE1|15012024|16012024|0||350,00|0,00|1|350,00|350,00|42,00|0,00|||||
|D190|000|6352|12,00|350,00|350,00|42,00|0,00||
|D190|000|6353|12,00|10,00|10,00|1,20|0,00||
|D990|5|
";

const C_BLOCK: &str = "\
|C010|12345678000199|0|
|C170|9|ORPHAN||1|UN|1,00|
|C100|0|1|PART1|55|00|1|100|KEY1|20240101|20240102|30,00|0|0,00|0,00|30,00|9|
|C170|1|ITEM1||1|UN|10,00|
|C170|2|ITEM2||1|UN|20,00|
|C100|0|1|PART2|55|00|1|101|KEY2|20240103|20240103|5,00|0|0,00|0,00|5,00|9|
|C170|1|ITEM3||1|UN|abc|
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn processor() -> SpedProcessor {
    SpedProcessor::new(SpedSchema::default(), SpedConfig::default()).unwrap()
}

fn texts(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    let values = df.column(column).unwrap().cast(&DataType::String).unwrap();
    values
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn text(df: &DataFrame, column: &str, row: usize) -> Option<String> {
    texts(df, column).swap_remove(row)
}

fn number(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

/// Test D block consolidation with day-first dates and freight labels
///
/// Purpose: Validate enrichment rules that differ from block C
/// Benefit: Catches regressions in per-record date formats and indicator sets
#[test]
fn test_d_block_consolidation() {
    let output = processor().process_text("d.txt", D_BLOCK).unwrap();

    let d100 = &output.tables["D100"];
    assert_eq!(text(d100, "IND_OPER", 0).as_deref(), Some("Saída"));
    assert_eq!(text(d100, "IND_EMIT", 0).as_deref(), Some("Emissão própria"));
    assert_eq!(
        text(d100, "IND_FRT", 0).as_deref(),
        Some("Destinatário/remetente")
    );
    assert_eq!(text(d100, "DT_DOC_DATE", 0).as_deref(), Some("2024-01-15"));

    let d = &output.consolidated["D"];
    assert_eq!(d.height(), 2);
    assert_eq!(column_names(d)[0], "D010_CNPJ");
    assert_eq!(text(d, "D190_CFOP", 0).as_deref(), Some("6352"));
    assert_eq!(number(d, "D190_VL_OPR", 1), Some(10.0));
    assert_eq!(number(d, "VL_DOC", 1), Some(350.0));
}

/// Test parent attribution, orphan children and numeric failures together
#[test]
fn test_parent_attribution_and_orphans() {
    let output = processor().process_text("c.txt", C_BLOCK).unwrap();

    let c170 = &output.tables["C170"];
    let parents: Vec<Option<i64>> = c170
        .column("C100_INDEX")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(parents, vec![Some(-1), Some(0), Some(0), Some(1)]);
    assert_eq!(number(c170, "VL_ITEM", 3), None);
    assert_eq!(output.metrics.conversion_failures, 1);

    let c = &output.consolidated["C"];
    assert_eq!(c.height(), 3);
    assert!(
        texts(c, "C170_COD_ITEM")
            .iter()
            .all(|v| v.as_deref() != Some("ORPHAN"))
    );
}

/// Test cross-checking document totals against their items
#[test]
fn test_document_totals_divergence() {
    let processor = processor();
    let output = processor.process_text("c.txt", C_BLOCK).unwrap();

    // document 101 has one item whose value failed conversion
    let divergences = processor.document_total_divergences(&output.tables).unwrap();
    assert_eq!(divergences.len(), 1);
    assert_eq!(divergences[0].document_number, "101");
    assert_eq!(divergences[0].index, "1");
}

/// Test a caller-supplied schema loaded from YAML
#[test]
fn test_custom_schema_from_yaml() {
    let schema = SpedSchema::from_yaml_str(
        r#"
layouts:
  - code: "0000"
    fields: [REG, NOME]
  - code: "0150"
    fields: [REG, COD_PART, VL]
    numeric_fields: [VL]
groups:
  - name: participants
    parent: "0150"
    parent_index: "0150_INDEX"
    header_index: "0000_INDEX"
    header: "0000"
"#,
    )
    .unwrap();
    let processor = SpedProcessor::new(schema, SpedConfig::default()).unwrap();

    let output = processor
        .process_text(
            "custom.txt",
            "|0000|EMPRESA|\n|0150|P1|1.234,56|\n|0150|P2||\n|C100|ignored|\n",
        )
        .unwrap();

    assert_eq!(output.metrics.processed_lines, 3);
    assert_eq!(output.metrics.unknown_lines, 1);

    let participants = &output.consolidated["participants"];
    assert_eq!(
        column_names(participants),
        vec!["0000_NOME", "REG", "COD_PART", "VL"]
    );
    assert_eq!(number(participants, "VL", 0), Some(1234.56));
    assert_eq!(number(participants, "VL", 1), None);
    assert!(
        texts(participants, "0000_NOME")
            .iter()
            .all(|v| v.as_deref() == Some("EMPRESA"))
    );
}

/// Test batch processing of a directory followed by Parquet export
///
/// Purpose: Validate the full path from directory discovery to output files
/// Benefit: Ensures concatenation across files and export file naming hold together
#[tokio::test]
async fn test_directory_batch_to_parquet() {
    let input_dir = TempDir::new().unwrap();
    write_fixture(&input_dir, "01_c.txt", C_BLOCK);
    write_fixture(&input_dir, "02_d.sped", D_BLOCK);
    write_fixture(&input_dir, "readme.md", "not a SPED file");

    let files = collect_inputs(&[input_dir.path().to_path_buf()]).unwrap();
    assert_eq!(files.len(), 2);

    let batch = processor().process_files(&files).await.unwrap();
    assert_eq!(batch.files_processed(), 2);
    assert_eq!(batch.consolidated["C"].height(), 3);
    assert_eq!(batch.consolidated["D"].height(), 2);
    assert_eq!(batch.metrics.total_lines, 13);

    let output_dir = TempDir::new().unwrap();
    let written = write_outputs(&batch, output_dir.path()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["C_CONSOLIDADO.parquet", "D_CONSOLIDADO.parquet"]);
    assert!(!output_dir.path().join("E_CONSOLIDADO.parquet").exists());

    let file = fs::File::open(output_dir.path().join("D_CONSOLIDADO.parquet")).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.column("VL_DOC").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("DT_DOC_DATE").unwrap().dtype(), &DataType::Date);
    assert!(df.column("D100_INDEX").is_err());
}

/// Test that strict batches surface the failing file's error
#[tokio::test]
async fn test_strict_batch_reports_parse_error() {
    let input_dir = TempDir::new().unwrap();
    let good = write_fixture(&input_dir, "good.txt", C_BLOCK);
    let bad = write_fixture(&input_dir, "bad.txt", "|C010|1|0|\n|C1\n");

    let processor = SpedProcessor::new(
        SpedSchema::default(),
        SpedConfig::default().with_strict_mode(true),
    )
    .unwrap();

    match processor.process_files(&[good, bad]).await {
        Err(SpedError::Parse { line_number, .. }) => assert_eq!(line_number, 2),
        other => panic!("Expected parse error, got {:?}", other.map(|b| b.metrics)),
    }
}
