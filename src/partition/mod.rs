//! Work partitioning module
//!
//! Supports: static lists, a column of an earlier CSV output
//!
//! # Overview
//!
//! A crawl is a list of targets (categories, sellers). Sources produce the
//! targets; [`chunk_contiguous`] splits them into one contiguous chunk per
//! worker so results can be merged back in the original order.

mod sources;
mod types;

pub use sources::{CsvColumnSource, ListSource};
pub use types::{chunk_contiguous, unique_in_order, Target, TargetSource};

#[cfg(test)]
mod tests;
