//! Resume state persistence
//!
//! Keeps the completed targets of every job in memory and, when backed by a
//! file, rewrites that file after each completed target. Writes go to a
//! sibling `.tmp` file that is then renamed over the real one.

use super::types::State;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared record of which targets are done.
///
/// Clones share the same state, so concurrent workers can mark their
/// targets through one manager.
#[derive(Debug, Clone)]
pub struct StateManager {
    /// State file; empty for in-memory state
    path: PathBuf,
    state: Arc<RwLock<State>>,
    /// Held while the file is rewritten
    write_lock: Arc<Mutex<()>>,
    /// Rewrite the file after every change
    persist_each: bool,
}

impl StateManager {
    /// Empty state written to `path` after every change
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::build(path.as_ref().to_path_buf(), State::new())
    }

    /// State that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            persist_each: false,
            ..Self::build(PathBuf::new(), State::new())
        }
    }

    /// State read from `path` when the file exists, written back to it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self::build(path, State::new()));
        }

        let json = std::fs::read_to_string(&path).map_err(|e| {
            Error::state(format!("Cannot read state file '{}': {e}", path.display()))
        })?;
        let state: State = serde_json::from_str(&json).map_err(|e| {
            Error::state(format!("State file '{}' is not valid: {e}", path.display()))
        })?;
        debug!(
            "Resuming from {} ({} jobs)",
            path.display(),
            state.jobs.len()
        );
        Ok(Self::build(path, state))
    }

    fn build(path: PathBuf, state: State) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
            write_lock: Arc::new(Mutex::new(())),
            persist_each: true,
        }
    }

    /// Write the state file; a no-op for in-memory state
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let _writing = self.write_lock.lock().await;
        let json = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, json).await.map_err(|e| {
            Error::state(format!("Cannot write '{}': {e}", staging.display()))
        })?;
        tokio::fs::rename(&staging, &self.path).await.map_err(|e| {
            Error::state(format!("Cannot replace '{}': {e}", self.path.display()))
        })?;
        Ok(())
    }

    /// Check whether `target` of `job` finished in this or an earlier run
    pub async fn is_completed(&self, job: &str, target: &str) -> bool {
        self.state.read().await.is_completed(job, target)
    }

    /// Record that `target` of `job` finished
    pub async fn mark_completed(
        &self,
        job: &str,
        target: &str,
        records: usize,
        pages: u32,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .get_job_mut(job)
            .mark_target_completed(target, records, pages);
        self.persist().await
    }

    /// Ids of the completed targets of `job`, sorted
    pub async fn completed_targets(&self, job: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .get_job(job)
            .map(|j| {
                j.completed_targets()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget everything recorded for `job`, so it runs again in full
    pub async fn reset_job(&self, job: &str) -> Result<()> {
        self.state.write().await.jobs.remove(job);
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        if self.persist_each {
            self.save().await
        } else {
            Ok(())
        }
    }

    /// The state file path; empty for in-memory state
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the state has no backing file
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}
