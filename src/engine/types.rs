//! Engine types
//!
//! Configuration and outcome types for the extraction engine.

use crate::pagination::AdvanceOutcome;

/// Default upper bound on pages when no page limit is given
pub const DEFAULT_SAFETY_CEILING: u32 = 10_000;

/// Configuration for one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Stop after this many pages with records
    pub max_pages: Option<u32>,
    /// Hard bound on pages for unbounded runs
    pub safety_ceiling: u32,
    /// Flush to the sink every time this many records are pending
    pub checkpoint_every: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            safety_ceiling: DEFAULT_SAFETY_CEILING,
            checkpoint_every: None,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page limit; zero means no limit
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages.filter(|n| *n > 0);
        self
    }

    /// Set the safety ceiling
    #[must_use]
    pub fn with_safety_ceiling(mut self, ceiling: u32) -> Self {
        self.safety_ceiling = ceiling.max(1);
        self
    }

    /// Set the checkpoint interval; zero disables checkpointing
    #[must_use]
    pub fn with_checkpoint_every(mut self, every: Option<usize>) -> Self {
        self.checkpoint_every = every.filter(|n| *n > 0);
        self
    }

    /// Effective page bound and whether it comes from `max_pages`.
    ///
    /// Never zero: the loop always reads the first page before checking it.
    pub fn page_bound(&self) -> (u32, bool) {
        match self.max_pages {
            Some(max) if max > 0 && max <= self.safety_ceiling => (max, true),
            _ => (self.safety_ceiling.max(1), false),
        }
    }
}

/// Why an engine invocation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// A page produced no records
    NoMoreRecords,
    /// `max_pages` reached
    PageLimit,
    /// The safety ceiling was reached on an otherwise unbounded run
    SafetyCeiling,
    /// The advancer reported something other than `Advanced`
    PaginationEnded(AdvanceOutcome),
    /// The start locator could not be loaded
    StartFailed,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMoreRecords => f.write_str("no more records"),
            Self::PageLimit => f.write_str("page limit"),
            Self::SafetyCeiling => f.write_str("safety ceiling"),
            Self::PaginationEnded(outcome) => write!(f, "pagination ended ({outcome})"),
            Self::StartFailed => f.write_str("start navigation failed"),
        }
    }
}

/// Result of one engine invocation
#[derive(Debug, Clone)]
pub struct CrawlOutcome<R> {
    /// Every record, in page order
    pub records: Vec<R>,
    /// Pages that produced records
    pub pages_visited: u32,
    /// Why the loop stopped
    pub reason: TerminationReason,
    /// Pages whose extraction failed
    pub extraction_failures: u32,
    /// Batches handed to the sink
    pub batches_flushed: usize,
}

impl<R> CrawlOutcome<R> {
    /// An outcome with nothing in it
    pub fn empty(reason: TerminationReason) -> Self {
        Self {
            records: Vec::new(),
            pages_visited: 0,
            reason,
            extraction_failures: 0,
            batches_flushed: 0,
        }
    }

    /// Number of records collected
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
