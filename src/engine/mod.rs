//! Extraction engine module
//!
//! The pagination-driven extraction loop with checkpointing.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExtractionEngine` - Drives one paginated listing to completion
//! - `EngineConfig` - Page limit, safety ceiling, checkpoint interval
//! - `CrawlOutcome` / `TerminationReason` - What came back and why it stopped
//!
//! Each invocation is sequential: every step awaits the browser before the
//! next one. Extraction and navigation problems end or shorten the run but
//! never fail it; only a sink failure is returned as an error.

mod types;

pub use types::{CrawlOutcome, EngineConfig, TerminationReason, DEFAULT_SAFETY_CEILING};

use crate::browser::Browser;
use crate::error::{Error, Result};
use crate::extract::{PageExtractor, Record};
use crate::pagination::{Advancer, PaginationState};
use crate::sink::CheckpointSink;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the extract / checkpoint / advance loop over one listing
#[derive(Debug, Clone, Default)]
pub struct ExtractionEngine {
    config: EngineConfig,
}

impl ExtractionEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Crawl a paginated listing starting at `start`.
    ///
    /// The loop stops on the first of: a page without records, an advance
    /// outcome other than `Advanced`, or the page bound. Full checkpoint
    /// batches are flushed as soon as they are complete, the tail on exit.
    pub async fn run(
        &self,
        browser: &mut dyn Browser,
        start: &str,
        extractor: &dyn PageExtractor,
        advancer: &dyn Advancer,
        sink: Option<&mut dyn CheckpointSink<Record>>,
    ) -> Result<CrawlOutcome<Record>> {
        if let Err(e) = browser.navigate(start).await {
            warn!("Could not load {start}: {e}");
            return Ok(CrawlOutcome::empty(TerminationReason::StartFailed));
        }

        self.run_loaded(browser, extractor, advancer, sink).await
    }

    /// Crawl a paginated listing from the page the browser already shows.
    ///
    /// Used for listings embedded in another page, such as the reviews of a
    /// profile. Without a loaded page the outcome is `StartFailed`.
    pub async fn run_loaded(
        &self,
        browser: &mut dyn Browser,
        extractor: &dyn PageExtractor,
        advancer: &dyn Advancer,
        mut sink: Option<&mut dyn CheckpointSink<Record>>,
    ) -> Result<CrawlOutcome<Record>> {
        let started = Instant::now();
        let origin = match browser.current_page().await {
            Ok(page) => page.url,
            Err(e) => {
                warn!("No page to start from: {e}");
                return Ok(CrawlOutcome::empty(TerminationReason::StartFailed));
            }
        };

        let (bound, bound_is_max_pages) = self.config.page_bound();
        let mut state = PaginationState::new();
        let mut extraction_failures = 0;
        let mut batches_flushed = 0;

        let reason = loop {
            let records = match self.extract_current(browser, extractor).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Page {}: extraction failed: {e}", state.current_page_index);
                    extraction_failures += 1;
                    Vec::new()
                }
            };

            if records.is_empty() {
                break TerminationReason::NoMoreRecords;
            }

            let count = records.len();
            state.record_page(records);
            info!(
                "Page {}: {count} records [{}]",
                state.current_page_index,
                state.total_records()
            );

            if let (Some(sink), Some(every)) = (sink.as_deref_mut(), self.config.checkpoint_every)
            {
                batches_flushed += flush(&mut state, sink, every, false)?;
            }

            if state.pages_visited >= bound {
                break if bound_is_max_pages {
                    TerminationReason::PageLimit
                } else {
                    TerminationReason::SafetyCeiling
                };
            }

            let outcome = advancer.advance(browser).await;
            if outcome.is_terminal() {
                break TerminationReason::PaginationEnded(outcome);
            }
            state.next_page();
        };

        if let Some(sink) = sink.as_deref_mut() {
            let size = self.config.checkpoint_every.unwrap_or(usize::MAX);
            batches_flushed += flush(&mut state, sink, size, true)?;
        }

        info!(
            "Finished {origin}: {} pages, {} records ({reason}) in {:?}",
            state.pages_visited,
            state.total_records(),
            started.elapsed()
        );

        Ok(CrawlOutcome {
            pages_visited: state.pages_visited,
            records: state.into_records(),
            reason,
            extraction_failures,
            batches_flushed,
        })
    }

    async fn extract_current(
        &self,
        browser: &dyn Browser,
        extractor: &dyn PageExtractor,
    ) -> Result<Vec<Record>> {
        let page = browser.current_page().await?;
        extractor.extract(&page)
    }
}

/// Hand every ready batch to the sink; returns how many were written
fn flush(
    state: &mut PaginationState<Record>,
    sink: &mut dyn CheckpointSink<Record>,
    size: usize,
    allow_partial: bool,
) -> Result<usize> {
    let mut written = 0;
    while let Some(range) = state.next_batch(size, allow_partial) {
        let end = range.end;
        let len = range.len();
        sink.write_batch(&state.accumulated[range]).map_err(|e| {
            if e.is_data_loss() {
                e
            } else {
                Error::sink(format!("checkpoint write failed: {e}"))
            }
        })?;
        state.mark_flushed(end);
        written += 1;
        debug!("Checkpoint: {len} records flushed ({end} total)");
    }
    Ok(written)
}
