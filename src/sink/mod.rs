//! Checkpoint sink module
//!
//! Supports: CSV (UTF-8 BOM), JSON Lines, Parquet, in-memory, shared, dedup
//!
//! # Overview
//!
//! Sinks receive the checkpoint batches flushed by the extraction engine.
//! They only ever append: a batch is written once, in order, and file sinks
//! never truncate an existing file.

mod columnar;
mod delimited;
mod lines;
mod memory;
mod types;

pub use columnar::{ParquetSink, ParquetSinkConfig};
pub use delimited::CsvSink;
pub use lines::JsonlSink;
pub use memory::{DedupSink, MemorySink, SharedSink};
pub use types::{CheckpointSink, SinkRow};

use crate::error::Result;
use crate::types::OutputFormat;
use std::path::{Path, PathBuf};

/// Path of the output file `name` in `dir` for `format`
pub fn output_path(dir: impl AsRef<Path>, name: &str, format: OutputFormat) -> PathBuf {
    dir.as_ref().join(format!("{name}.{}", format.extension()))
}

/// Open a file sink of the given format at `path`
pub fn open_sink<R: SinkRow + 'static>(
    format: OutputFormat,
    path: impl AsRef<Path>,
) -> Result<Box<dyn CheckpointSink<R>>> {
    let sink: Box<dyn CheckpointSink<R>> = match format {
        OutputFormat::Csv => Box::new(CsvSink::open(path)?),
        OutputFormat::Jsonl => Box::new(JsonlSink::open(path)?),
        OutputFormat::Parquet => Box::new(ParquetSink::create(path, ParquetSinkConfig::default())?),
    };
    Ok(sink)
}
