//! JSON Lines checkpoint sink

use super::types::{CheckpointSink, SinkRow};
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appending sink writing one JSON object per line
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows_written: usize,
}

impl JsonlSink {
    /// Open `path` for appending, creating it (and its directory) if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            rows_written: 0,
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: SinkRow> CheckpointSink<R> for JsonlSink {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::sink(format!("{} already finished", self.path.display())));
        };
        for row in batch {
            serde_json::to_writer(&mut *writer, &row.to_json())?;
            writer.write_all(b"\n")?;
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
