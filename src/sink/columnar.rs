//! Parquet checkpoint sink
//!
//! Every column is a nullable UTF-8 string. Parquet files cannot be
//! appended to, so an existing file is never reopened: the sink picks the
//! next free `<stem>-<n>.parquet` name instead.

use super::types::{CheckpointSink, SinkRow};
use crate::error::{Error, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for the Parquet sink
#[derive(Debug, Clone)]
pub struct ParquetSinkConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetSinkConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 64 * 1024,
        }
    }
}

impl ParquetSinkConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Parquet sink; the writer opens lazily on the first non-empty batch
pub struct ParquetSink {
    path: PathBuf,
    config: ParquetSinkConfig,
    writer: Option<(ArrowWriter<File>, SchemaRef)>,
    finished: bool,
    rows_written: usize,
}

impl ParquetSink {
    /// Create a sink writing to `path`, or to the next free sibling name
    /// if `path` already exists
    pub fn create(path: impl AsRef<Path>, config: ParquetSinkConfig) -> Result<Self> {
        let path = free_path(path.as_ref());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            config,
            writer: None,
            finished: false,
            rows_written: 0,
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_writer(&mut self, columns: &[String]) -> Result<&mut (ArrowWriter<File>, SchemaRef)> {
        if self.writer.is_none() {
            let schema: SchemaRef = Arc::new(Schema::new(
                columns
                    .iter()
                    .map(|c| Field::new(c, DataType::Utf8, true))
                    .collect::<Vec<_>>(),
            ));
            let file = File::create(&self.path)?;
            let writer = ArrowWriter::try_new(
                file,
                schema.clone(),
                Some(self.config.build_properties()),
            )?;
            debug!("Opened {}", self.path.display());
            self.writer = Some((writer, schema));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::sink("parquet writer unavailable"))
    }
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("path", &self.path)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

impl<R: SinkRow> CheckpointSink<R> for ParquetSink {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        if self.finished {
            return Err(Error::sink(format!("{} already finished", self.path.display())));
        }
        let Some(first) = batch.first() else {
            return Ok(());
        };

        let columns = first.columns();
        let (writer, schema) = self.open_writer(&columns)?;
        let width = schema.fields().len();

        let rows: Vec<Vec<String>> = batch.iter().map(SinkRow::cells).collect();
        if let Some(bad) = rows.iter().find(|cells| cells.len() != width) {
            return Err(Error::sink(format!(
                "row has {} cells, schema has {width} columns",
                bad.len()
            )));
        }

        let arrays: Vec<ArrayRef> = (0..width)
            .map(|i| {
                Arc::new(StringArray::from(
                    rows.iter().map(|cells| cells[i].as_str()).collect::<Vec<_>>(),
                )) as ArrayRef
            })
            .collect();
        let record_batch = RecordBatch::try_new(schema.clone(), arrays)?;
        writer.write(&record_batch)?;

        self.rows_written += batch.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        if let Some((writer, _)) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }
}

impl Drop for ParquetSink {
    fn drop(&mut self) {
        if let Some((writer, _)) = self.writer.take() {
            if let Err(e) = writer.close() {
                warn!("Failed to close {}: {e}", self.path.display());
            }
        }
    }
}

/// `path` if free, else the first `<stem>-<n>.<ext>` that is
fn free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "parquet".to_string());
    (1..)
        .map(|n| path.with_file_name(format!("{stem}-{n}.{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
