//! CLI module
//!
//! Command-line interface for running collections.
//!
//! # Commands
//!
//! - `categories` - Crawl category listings
//! - `profiles` - Crawl seller profiles with reviews and services
//! - `all` - Categories, then the profiles of every seller found
//! - `validate` - Check a site definition
//! - `list` - List built-in sites

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
