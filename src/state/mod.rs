//! State management module
//!
//! Handles resumable runs: which targets of which job are already done.
//! State is persisted between runs so an interrupted crawl picks up where it
//! stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Completed targets per job
//! - `StateManager` - File-based state persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{JobState, State, TargetState};
