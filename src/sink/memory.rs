//! In-memory and wrapping sinks
//!
//! [`MemorySink`] keeps every batch as written; useful for dry runs and for
//! asserting on checkpoint boundaries. [`SharedSink`] and [`DedupSink`]
//! wrap another sink.

use super::types::CheckpointSink;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Collects batches in memory
#[derive(Debug, Clone)]
pub struct MemorySink<R> {
    batches: Vec<Vec<R>>,
}

impl<R> Default for MemorySink<R> {
    fn default() -> Self {
        Self {
            batches: Vec::new(),
        }
    }
}

impl<R: Clone> MemorySink<R> {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches in write order
    pub fn batches(&self) -> &[Vec<R>] {
        &self.batches
    }

    /// Length of each batch, in write order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Vec::len).collect()
    }

    /// Every row, flattened in write order
    pub fn rows(&self) -> Vec<R> {
        self.batches.iter().flatten().cloned().collect()
    }
}

impl<R: Clone + Send> CheckpointSink<R> for MemorySink<R> {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        if !batch.is_empty() {
            self.batches.push(batch.to_vec());
        }
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

/// Handle onto a sink shared by concurrent workers.
///
/// Appends are serialised through a mutex, so each batch lands whole.
/// Clones write to the same destination; call [`CheckpointSink::finish`]
/// once, after every worker is done.
pub struct SharedSink<R> {
    inner: Arc<Mutex<Box<dyn CheckpointSink<R>>>>,
}

impl<R> Clone for SharedSink<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> std::fmt::Debug for SharedSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSink")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<R> SharedSink<R> {
    /// Share `sink` between workers
    pub fn new(sink: Box<dyn CheckpointSink<R>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut dyn CheckpointSink<R>) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::sink("shared sink poisoned by a panicked writer"))?;
        f(&mut **guard)
    }
}

impl<R> CheckpointSink<R> for SharedSink<R> {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        self.with_inner(|sink| sink.write_batch(batch))
    }

    fn finish(&mut self) -> Result<()> {
        self.with_inner(|sink| sink.finish())
    }

    fn rows_written(&self) -> usize {
        self.with_inner(|sink| Ok(sink.rows_written())).unwrap_or(0)
    }
}

/// Drops rows the wrapped sink has already received
///
/// The seen-set lives as long as the wrapper, so put it inside a
/// [`SharedSink`] to deduplicate across workers.
pub struct DedupSink<R> {
    inner: Box<dyn CheckpointSink<R>>,
    seen: HashSet<R>,
    dropped: usize,
}

impl<R> std::fmt::Debug for DedupSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupSink")
            .field("seen", &self.seen.len())
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

impl<R: Eq + Hash> DedupSink<R> {
    /// Deduplicate rows on their way to `inner`
    pub fn new(inner: Box<dyn CheckpointSink<R>>) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
            dropped: 0,
        }
    }

    /// Rows dropped as duplicates so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<R: Eq + Hash + Clone + Send> CheckpointSink<R> for DedupSink<R> {
    fn write_batch(&mut self, batch: &[R]) -> Result<()> {
        let fresh: Vec<R> = batch
            .iter()
            .filter(|row| self.seen.insert((*row).clone()))
            .cloned()
            .collect();
        self.dropped += batch.len() - fresh.len();

        if fresh.is_empty() {
            return Ok(());
        }
        self.inner.write_batch(&fresh)
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }

    fn rows_written(&self) -> usize {
        self.inner.rows_written()
    }
}
