//! Pagination types and traits
//!
//! Defines the advance outcome, the per-invocation pagination state, and
//! the trait every advance strategy implements.

use crate::browser::Browser;
use async_trait::async_trait;
use std::ops::Range;

/// Result of trying to move to the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvanceOutcome {
    /// The next page is loaded
    Advanced,
    /// No "next" control on the page
    NoControlFound,
    /// The control exists but is disabled
    Disabled,
    /// Triggering the control failed or made no progress
    NavigationFailed,
}

impl AdvanceOutcome {
    /// Check if pagination moved forward
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced)
    }

    /// Check if this outcome ends pagination
    pub fn is_terminal(&self) -> bool {
        !self.is_advanced()
    }
}

impl std::fmt::Display for AdvanceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Advanced => "advanced",
            Self::NoControlFound => "no next control",
            Self::Disabled => "next control disabled",
            Self::NavigationFailed => "navigation failed",
        };
        f.write_str(text)
    }
}

/// Tracks pagination state during one engine invocation
#[derive(Debug, Clone)]
pub struct PaginationState<R> {
    /// Current page number, starting at 1
    pub current_page_index: u32,
    /// Every record seen so far, in page order
    pub accumulated: Vec<R>,
    /// Pages that produced records
    pub pages_visited: u32,
    /// How many leading records were already handed to the sink
    flushed: usize,
}

impl<R> Default for PaginationState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PaginationState<R> {
    /// Create a new pagination state on page 1
    pub fn new() -> Self {
        Self {
            current_page_index: 1,
            accumulated: Vec::new(),
            pages_visited: 0,
            flushed: 0,
        }
    }

    /// Record a non-empty page of results
    pub fn record_page(&mut self, records: Vec<R>) {
        self.accumulated.extend(records);
        self.pages_visited += 1;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.current_page_index += 1;
    }

    /// Records collected so far
    pub fn total_records(&self) -> usize {
        self.accumulated.len()
    }

    /// Records not yet handed to the sink
    pub fn unflushed(&self) -> usize {
        self.accumulated.len() - self.flushed
    }

    /// Range of the next batch to flush.
    ///
    /// Full batches are exactly `size` records long. A shorter tail is only
    /// returned when `allow_partial` is set.
    pub fn next_batch(&self, size: usize, allow_partial: bool) -> Option<Range<usize>> {
        let pending = self.unflushed();
        if pending == 0 || size == 0 {
            return None;
        }
        if pending >= size {
            Some(self.flushed..self.flushed + size)
        } else if allow_partial {
            Some(self.flushed..self.accumulated.len())
        } else {
            None
        }
    }

    /// Mark everything up to `end` as flushed
    pub fn mark_flushed(&mut self, end: usize) {
        debug_assert!(end >= self.flushed && end <= self.accumulated.len());
        self.flushed = end;
    }

    /// Hand back the records
    pub fn into_records(self) -> Vec<R> {
        self.accumulated
    }
}

/// Core trait for pagination strategies
#[async_trait]
pub trait Advancer: Send + Sync {
    /// Try to move the browser to the next page.
    ///
    /// Never fails: every problem maps to a terminal [`AdvanceOutcome`].
    async fn advance(&self, browser: &mut dyn Browser) -> AdvanceOutcome;
}
