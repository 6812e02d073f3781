//! Sink types and traits
//!
//! Defines what a row looks like to a sink and the checkpoint sink contract.

use crate::error::Result;
use crate::extract::{Record, SellerProfile};
use crate::types::JsonValue;

/// Anything a sink can persist as one row
pub trait SinkRow: Send + Sync {
    /// Column names, in order
    fn columns(&self) -> Vec<String>;

    /// Cell values, in column order
    fn cells(&self) -> Vec<String>;

    /// Structured form for line-oriented JSON output
    fn to_json(&self) -> JsonValue;
}

impl SinkRow for Record {
    fn columns(&self) -> Vec<String> {
        Record::columns(self.kind())
            .iter()
            .map(|c| (*c).to_string())
            .collect()
    }

    fn cells(&self) -> Vec<String> {
        Record::cells(self)
    }

    fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl SinkRow for SellerProfile {
    fn columns(&self) -> Vec<String> {
        SellerProfile::columns(self)
    }

    fn cells(&self) -> Vec<String> {
        SellerProfile::cells(self)
    }

    fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Destination for checkpoint batches.
///
/// Append-only and order-preserving: batches land in the order they are
/// written and are never rewritten. A sink is owned by one engine
/// invocation unless it is wrapped in a [`SharedSink`](super::SharedSink).
pub trait CheckpointSink<R>: Send {
    /// Append a batch of rows
    fn write_batch(&mut self, batch: &[R]) -> Result<()>;

    /// Flush and release the destination; later writes may fail
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Rows appended through this sink so far
    fn rows_written(&self) -> usize;
}

impl<R> CheckpointSink<R> for Box<dyn CheckpointSink<R>> {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        self.as_mut().write_batch(batch)
    }

    fn finish(&mut self) -> Result<()> {
        self.as_mut().finish()
    }

    fn rows_written(&self) -> usize {
        self.as_ref().rows_written()
    }
}
