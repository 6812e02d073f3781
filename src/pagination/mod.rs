//! Pagination module
//!
//! Supports: next control (with progress check), page-number parameter,
//! single page, cancellation
//!
//! # Overview
//!
//! The pagination module decides whether a listing has another page and
//! moves the browser there. Every strategy answers with an
//! [`AdvanceOutcome`]; anything other than `Advanced` ends the loop.

mod strategies;
mod types;

pub use strategies::{
    CancellableAdvancer, NextControlAdvancer, PageParamAdvancer, ProgressSignal, SinglePageAdvancer,
};
pub use types::{AdvanceOutcome, Advancer, PaginationState};
