// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # market-harvest
//!
//! Batch collector for marketplace listings: category services, seller
//! profiles, buyer reviews and seller portfolios.
//!
//! ## Features
//!
//! - **Paginated extraction**: follow a "next" control until records run
//!   out, the control is disabled, or a page limit is reached
//! - **Checkpointing**: flush records to the sink in fixed-size batches
//! - **Declarative sites**: selectors, fallbacks and pagination in YAML
//! - **Output**: CSV (UTF-8 BOM), JSON Lines, Parquet
//! - **Resumable runs**: completed targets are recorded and skipped
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market_harvest::browser::HttpBrowserFactory;
//! use market_harvest::crawl::Crawler;
//! use market_harvest::{load_site, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let site = load_site("kmong")?;
//!     let factory = Arc::new(HttpBrowserFactory::new(site.browser_config()));
//!     let crawler = Crawler::new(site, factory);
//!
//!     let def = crawler.site().listing("services").unwrap().clone();
//!     let targets = crawler.listing_targets(&def, &["661".to_string()]);
//!     let report = crawler.crawl_listing("services", targets, None).await?;
//!     println!("{} records", report.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Crawler                                │
//! │  crawl_listing(targets) → ListingReport                         │
//! │  crawl_profiles(sellers) → ProfileReport                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Browser  │  Extract  │   Paginate    │ Partition │    Sink     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ HTTP     │ Selectors │ Next control  │ Lists     │ CSV         │
//! │ Pacing   │ Patterns  │ Page marker   │ CSV column│ JSONL       │
//! │          │ Fallback  │ Cancellation  │ Chunking  │ Parquet     │
//! │          │ Profiles  │               │           │ Dedup       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Browsing sessions: HTTP, pacing, pagination controls
pub mod browser;

/// Pagination strategies
pub mod pagination;

/// Record and profile extraction
pub mod extract;

/// Checkpoint sinks (CSV, JSONL, Parquet)
pub mod sink;

/// State management for resumable runs
pub mod state;

/// Crawl targets and work partitioning
pub mod partition;

/// Template interpolation
pub mod template;

/// YAML loader for site definitions
pub mod loader;

/// Built-in site definitions
pub mod sites;

/// Paginated extraction engine
pub mod engine;

/// Multi-target crawl orchestration
pub mod crawl;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use crawl::{CrawlOptions, Crawler};
pub use engine::{CrawlOutcome, EngineConfig, ExtractionEngine, TerminationReason};
pub use loader::{load_site, load_site_from_str, SiteDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
