//! Export of consolidated frames to Parquet files

use crate::error::{Result, SpedError};

use polars::prelude::{
    DataFrame, ParquetCompression, ParquetWriter as PolarsParquetWriter, StatisticsOptions,
};
use std::path::Path;
use tracing::debug;

/// Write a frame as a Snappy-compressed Parquet file. Returns rows written.
pub fn write_parquet(df: &DataFrame, path: &Path) -> Result<u64> {
    let mut df = df.clone();
    let file = std::fs::File::create(path)
        .map_err(|e| SpedError::file(path, format!("Cannot create output file: {}", e)))?;

    PolarsParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .with_statistics(StatisticsOptions::default())
        .finish(&mut df)
        .map_err(|e| SpedError::file(path, format!("Failed to write parquet: {}", e)))?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(df.height() as u64)
}
