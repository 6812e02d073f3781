//! State types for tracking crawl progress
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-job state, keyed by job name (e.g. `categories`, `profiles`)
    #[serde(default)]
    pub jobs: BTreeMap<String, JobState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a job
    pub fn get_job(&self, job: &str) -> Option<&JobState> {
        self.jobs.get(job)
    }

    /// Get mutable state for a job, creating if needed
    pub fn get_job_mut(&mut self, job: &str) -> &mut JobState {
        self.jobs.entry(job.to_string()).or_default()
    }

    /// Check if a target of a job is completed
    pub fn is_completed(&self, job: &str, target: &str) -> bool {
        self.jobs
            .get(job)
            .is_some_and(|j| j.is_target_completed(target))
    }
}

/// State for a single job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    /// Per-target state, keyed by target id
    #[serde(default)]
    pub targets: BTreeMap<String, TargetState>,
}

impl JobState {
    /// Create a new empty job state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a target is completed
    pub fn is_target_completed(&self, target: &str) -> bool {
        self.targets.get(target).is_some_and(|t| t.completed)
    }

    /// Record a finished target
    pub fn mark_target_completed(&mut self, target: &str, records: usize, pages: u32) {
        self.targets
            .insert(target.to_string(), TargetState::completed(records, pages));
    }

    /// Ids of completed targets
    pub fn completed_targets(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter(|(_, t)| t.completed)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// State for a single crawl target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Whether this target has been fully crawled
    #[serde(default)]
    pub completed: bool,
    /// Records collected for this target
    #[serde(default)]
    pub records: usize,
    /// Pages visited for this target
    #[serde(default)]
    pub pages: u32,
    /// When the target finished
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TargetState {
    /// Create a completed target state
    pub fn completed(records: usize, pages: u32) -> Self {
        Self {
            completed: true,
            records,
            pages,
            completed_at: Some(Utc::now()),
        }
    }
}
