//! YAML Loader module
//!
//! Parse site definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `SiteDefinition` - Declarative site specification
//! - `ListingDefinition` / `ProfileDefinition` - What to crawl and how to read it
//! - YAML parsing with validation
//! - Builders turning definitions into extractors and advancers

mod build;
mod parser;
mod types;

pub use build::{build_advancer, build_extractor, build_profile_extractor};
pub use parser::{load_site, load_site_from_str};
pub use types::{
    BrowserDefinition, ListingDefinition, PaginationDefinition, PatternDefinition,
    ProfileDefinition, SelectorDefinition, SiteDefinition,
};

#[cfg(test)]
mod tests;
