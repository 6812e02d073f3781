//! Crawl options and reports

use crate::engine::{CrawlOutcome, EngineConfig, TerminationReason, DEFAULT_SAFETY_CEILING};
use crate::extract::{Record, SellerProfile};
use crate::loader::ListingDefinition;
use crate::partition::Target;

/// Job name under which profile targets are tracked in the state file
pub const PROFILE_JOB: &str = "profiles";

// ============================================================================
// Options
// ============================================================================

/// Run-wide settings; `Some` values override the listing definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Parallel workers, each with its own browser session
    pub workers: usize,
    /// Page limit per target
    pub max_pages: Option<u32>,
    /// Hard page bound when no limit applies
    pub safety_ceiling: u32,
    /// Records per checkpoint batch
    pub checkpoint_every: Option<usize>,
    /// Drop duplicate records across targets
    pub dedup: Option<bool>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            max_pages: None,
            safety_ceiling: DEFAULT_SAFETY_CEILING,
            checkpoint_every: None,
            dedup: None,
        }
    }
}

impl CrawlOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers (at least 1)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Override the page limit
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the safety ceiling
    #[must_use]
    pub fn with_safety_ceiling(mut self, ceiling: u32) -> Self {
        self.safety_ceiling = ceiling;
        self
    }

    /// Override the checkpoint interval
    #[must_use]
    pub fn with_checkpoint_every(mut self, every: Option<usize>) -> Self {
        self.checkpoint_every = every;
        self
    }

    /// Override deduplication
    #[must_use]
    pub fn with_dedup(mut self, dedup: Option<bool>) -> Self {
        self.dedup = dedup;
        self
    }

    /// Engine configuration for one listing
    pub fn engine_config(&self, listing: &ListingDefinition) -> EngineConfig {
        EngineConfig::new()
            .with_max_pages(self.max_pages.or(listing.max_pages))
            .with_safety_ceiling(self.safety_ceiling)
            .with_checkpoint_every(self.checkpoint_every.or(listing.checkpoint_every))
    }

    /// Whether records of `listing` are deduplicated
    pub fn dedup_for(&self, listing: &ListingDefinition) -> bool {
        self.dedup.unwrap_or(listing.dedup)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// How one target went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Target id
    pub target: String,
    /// Pages visited
    pub pages: u32,
    /// Records collected
    pub records: usize,
    /// Why pagination stopped, when it ran
    pub reason: Option<TerminationReason>,
    /// Error that ended the target, if any
    pub error: Option<String>,
}

impl TargetReport {
    /// Report for a target whose engine run finished
    pub fn finished<R>(target: &Target, outcome: &CrawlOutcome<R>) -> Self {
        Self {
            target: target.id.clone(),
            pages: outcome.pages_visited,
            records: outcome.len(),
            reason: Some(outcome.reason),
            error: None,
        }
    }

    /// Report for a target that failed before finishing
    pub fn failed(target: &Target, error: impl std::fmt::Display) -> Self {
        Self {
            target: target.id.clone(),
            pages: 0,
            records: 0,
            reason: None,
            error: Some(error.to_string()),
        }
    }

    /// Check if the target failed
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.reason == Some(TerminationReason::StartFailed)
    }
}

/// Result of crawling one listing over many targets
#[derive(Debug, Clone, Default)]
pub struct ListingReport {
    /// Listing name
    pub listing: String,
    /// Records of every target, in target order
    pub records: Vec<Record>,
    /// Per-target results, in target order
    pub targets: Vec<TargetReport>,
    /// Targets skipped because an earlier run completed them
    pub skipped: Vec<String>,
    /// Records dropped as duplicates
    pub duplicates: usize,
}

impl ListingReport {
    /// Number of failed targets
    pub fn failures(&self) -> usize {
        self.targets.iter().filter(|t| t.is_failure()).count()
    }
}

/// Result of crawling seller profiles
#[derive(Debug, Clone, Default)]
pub struct ProfileReport {
    /// Profiles, in seller order
    pub profiles: Vec<SellerProfile>,
    /// Per-seller results, in seller order
    pub targets: Vec<TargetReport>,
    /// Sellers skipped because an earlier run completed them
    pub skipped: Vec<String>,
}

impl ProfileReport {
    /// Number of failed sellers
    pub fn failures(&self) -> usize {
        self.targets.iter().filter(|t| t.is_failure()).count()
    }
}
