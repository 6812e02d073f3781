//! Delimited (CSV) checkpoint sink
//!
//! UTF-8 with a byte-order mark. The file is opened in append mode; the
//! BOM and the header row are written only when the file starts out empty.

use super::types::{CheckpointSink, SinkRow};
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Appending CSV sink
pub struct CsvSink {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    needs_header: bool,
    rows_written: usize,
}

impl CsvSink {
    /// Open `path` for appending, creating it (and its directory) if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;
        if needs_header {
            file.write_all(UTF8_BOM)?;
        } else {
            debug!("Appending to existing {}", path.display());
        }

        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self {
            path,
            writer: Some(writer),
            needs_header,
            rows_written: 0,
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

impl<R: SinkRow> CheckpointSink<R> for CsvSink {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::sink(format!("{} already finished", self.path.display())));
        };
        let Some(first) = batch.first() else {
            return Ok(());
        };

        if self.needs_header {
            writer.write_record(first.columns())?;
            self.needs_header = false;
        }
        for row in batch {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;

        self.rows_written += batch.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }
}
