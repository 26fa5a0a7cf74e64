//! Concurrent batch processing

use super::{column_names, processor, sample_sped, text};
use crate::config::SpedConfig;
use polars::prelude::DataType;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|n| {
            let path = dir.path().join(format!("efd_{:02}.txt", n));
            let text = sample_sped().replace("|100|KEY1|", &format!("|{}|KEY1|", 1000 + n));
            fs::write(&path, text).unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn test_batch_concatenates_in_input_order() {
    let temp_dir = TempDir::new().unwrap();
    let paths = write_files(&temp_dir, 5);

    let batch = processor(SpedConfig::default().with_workers(3))
        .process_files(&paths)
        .await
        .unwrap();

    assert_eq!(batch.files_processed(), 5);
    assert_eq!(batch.files_failed(), 0);
    assert_eq!(batch.tables["C100"].height(), 10);
    assert_eq!(batch.consolidated["C"].height(), 15);
    assert_eq!(batch.metrics.total_lines, 60);
    assert_eq!(batch.metrics.processed_lines, 45);

    let c100 = &batch.tables["C100"];
    let first_docs: Vec<Option<String>> = (0..10)
        .step_by(2)
        .map(|row| text(c100, "NUM_DOC", row))
        .collect();
    let expected: Vec<Option<String>> = (1000..1005).map(|n| Some(n.to_string())).collect();
    assert_eq!(first_docs, expected);

    for (metrics, path) in batch.file_metrics.iter().zip(&paths) {
        assert_eq!(metrics.source, path.display().to_string());
    }
}

#[tokio::test]
async fn test_lenient_batch_records_failures() {
    let temp_dir = TempDir::new().unwrap();
    let mut paths = write_files(&temp_dir, 2);
    paths.insert(1, temp_dir.path().join("missing.txt"));

    let batch = processor(SpedConfig::default())
        .process_files(&paths)
        .await
        .unwrap();

    assert_eq!(batch.files_processed(), 2);
    assert_eq!(batch.files_failed(), 1);
    assert_eq!(batch.failures[0].path, paths[1]);
    assert_eq!(batch.failures[0].category, "File Error");
    assert_eq!(batch.metrics.errors_by_category["File Error"], 1);
    assert_eq!(batch.consolidated["C"].height(), 6);
}

#[tokio::test]
async fn test_strict_batch_propagates_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut paths = write_files(&temp_dir, 2);
    paths.push(temp_dir.path().join("missing.txt"));

    let result = processor(SpedConfig::default().with_strict_mode(true))
        .process_files(&paths)
        .await;

    let error = result.unwrap_err();
    assert!(error.is_file_error());
}

#[tokio::test]
async fn test_single_worker_keeps_input_order() {
    let temp_dir = TempDir::new().unwrap();
    let paths = write_files(&temp_dir, 3);

    let batch = processor(SpedConfig::default().with_workers(1))
        .process_files(&paths)
        .await
        .unwrap();

    assert_eq!(batch.files_processed(), 3);
    let c = &batch.consolidated["C"];
    assert_eq!(c.height(), 9);
    let docs: Vec<Option<String>> = (0..9).step_by(3).map(|row| text(c, "NUM_DOC", row)).collect();
    assert_eq!(
        docs,
        vec![Some("1000".into()), Some("1001".into()), Some("1002".into())]
    );
}

#[tokio::test]
async fn test_batch_unions_columns_across_files() {
    let temp_dir = TempDir::new().unwrap();
    let with_d = temp_dir.path().join("efd_d.txt");
    fs::write(
        &with_d,
        "|D010|12345678000199|\n|D100|0|1|PART9|57|00|1||900|CTE1|15012024|16012024|0||350,00|\n|D190|000|6352|12,00|350,00|\n",
    )
    .unwrap();
    let only_c = temp_dir.path().join("efd_c.txt");
    fs::write(
        &only_c,
        "|C010|12345678000199|0|\n|C100|0|1|PART1|55|00|1|100|KEY1|20240101|20240102|10,00|\n",
    )
    .unwrap();

    let batch = processor(SpedConfig::default())
        .process_files(&[only_c, with_d])
        .await
        .unwrap();

    // the C file has no C170 rows, so its consolidated C frame lacks item
    // columns; the D file contributes no C rows at all
    let c = &batch.consolidated["C"];
    assert_eq!(c.height(), 1);
    assert!(!column_names(c).iter().any(|name| name.starts_with("C170_")));

    let d = &batch.consolidated["D"];
    assert_eq!(d.height(), 1);
    assert_eq!(d.column("VL_DOC").unwrap().dtype(), &DataType::Float64);
    assert_eq!(text(d, "D190_CFOP", 0).as_deref(), Some("6352"));

    // raw frames from both files are stacked with the union of their columns
    assert_eq!(batch.tables["C100"].height(), 1);
    assert_eq!(batch.tables["D100"].height(), 1);
    assert_eq!(batch.tables["C170"].height(), 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let batch = processor(SpedConfig::default())
        .process_files(&[])
        .await
        .unwrap();

    assert_eq!(batch.files_processed(), 0);
    assert!(batch.consolidated.is_empty());
    assert_eq!(batch.metrics.total_lines, 0);
}
