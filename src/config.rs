//! Run configuration
//!
//! Settings for one collection run. They come from an optional JSON file
//! (`-C`) and are then overridden by command-line flags.

use crate::crawl::CrawlOptions;
use crate::engine::DEFAULT_SAFETY_CEILING;
use crate::error::{Error, Result};
use crate::sink::output_path;
use crate::state::StateManager;
use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Run Config
// ============================================================================

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory output files are written to
    pub output_dir: PathBuf,

    /// Output file format
    pub format: OutputFormat,

    /// Parallel workers
    pub workers: usize,

    /// Records per checkpoint batch (overrides the listing)
    pub checkpoint_every: Option<usize>,

    /// Page limit per target (overrides the listing)
    pub max_pages: Option<u32>,

    /// Page bound for runs without a page limit
    pub safety_ceiling: u32,

    /// State file for resumable runs
    pub state_file: Option<PathBuf>,

    /// Force deduplication on or off
    pub dedup: Option<bool>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            workers: 1,
            checkpoint_every: None,
            max_pages: None,
            safety_ceiling: DEFAULT_SAFETY_CEILING,
            state_file: None,
            dedup: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl RunConfig {
    /// Parse a run config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a run config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Apply command-line overrides, then validate
    pub fn with_overrides(mut self, overrides: RunOverrides) -> Result<Self> {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(ceiling) = overrides.safety_ceiling {
            self.safety_ceiling = ceiling;
        }
        if overrides.state_file.is_some() {
            self.state_file = overrides.state_file;
        }
        self.checkpoint_every = overrides.checkpoint_every.or(self.checkpoint_every);
        self.max_pages = overrides.max_pages.or(self.max_pages);
        if overrides.dedup {
            self.dedup = Some(true);
        }

        self.validate()?;
        Ok(self)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_value("workers", "must be at least 1"));
        }
        if self.safety_ceiling == 0 {
            return Err(Error::invalid_value("safety_ceiling", "must be at least 1"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }
        Ok(())
    }

    /// Crawl options for this run
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions::new()
            .with_workers(self.workers)
            .with_max_pages(self.max_pages)
            .with_safety_ceiling(self.safety_ceiling)
            .with_checkpoint_every(self.checkpoint_every)
            .with_dedup(self.dedup)
    }

    /// Resume state: the state file when configured, in-memory otherwise
    pub fn state_manager(&self) -> Result<StateManager> {
        match &self.state_file {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    /// Output file for `name` in the configured directory and format
    pub fn output_path(&self, name: &str) -> PathBuf {
        output_path(&self.output_dir, name, self.format)
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub workers: Option<usize>,
    pub checkpoint_every: Option<usize>,
    pub max_pages: Option<u32>,
    pub safety_ceiling: Option<u32>,
    pub state_file: Option<PathBuf>,
    pub dedup: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.workers, 1);
        assert_eq!(config.safety_ceiling, DEFAULT_SAFETY_CEILING);
        assert!(config.state_file.is_none());
        assert_eq!(config.output_path("services"), PathBuf::from("output/services.csv"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = RunConfig::from_json(
            r#"{"output_dir": "data", "format": "parquet", "workers": 4, "dedup": false}"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.format, OutputFormat::Parquet);
        assert_eq!(config.workers, 4);
        assert_eq!(config.dedup, Some(false));
        assert_eq!(config.max_pages, None);
        assert_eq!(
            config.output_path("reviews"),
            PathBuf::from("data/reviews.parquet")
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_and_invalid() {
        assert!(matches!(
            RunConfig::from_json(r#"{"workerz": 2}"#),
            Err(Error::JsonParse(_))
        ));
        assert!(matches!(
            RunConfig::from_json(r#"{"workers": 0}"#),
            Err(Error::InvalidConfigValue { .. })
        ));
        assert!(matches!(
            RunConfig::from_json(r#"{"max_pages": 0}"#),
            Err(Error::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"checkpoint_every": 50, "state_file": "state.json"}"#).unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.checkpoint_every, Some(50));
        assert_eq!(config.state_file, Some(PathBuf::from("state.json")));

        let missing = RunConfig::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, Error::Config { .. }));
    }

    #[test]
    fn test_overrides_win() {
        let config = RunConfig::from_json(r#"{"workers": 4, "max_pages": 10, "checkpoint_every": 20}"#)
            .unwrap()
            .with_overrides(RunOverrides {
                workers: Some(2),
                max_pages: Some(3),
                format: Some(OutputFormat::Jsonl),
                dedup: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.workers, 2);
        assert_eq!(config.max_pages, Some(3));
        assert_eq!(config.checkpoint_every, Some(20));
        assert_eq!(config.format, OutputFormat::Jsonl);
        assert_eq!(config.dedup, Some(true));

        let options = config.crawl_options();
        assert_eq!(options.workers, 2);
        assert_eq!(options.max_pages, Some(3));
        assert_eq!(options.dedup, Some(true));
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = RunConfig::default()
            .with_overrides(RunOverrides {
                safety_ceiling: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[tokio::test]
    async fn test_state_manager() {
        let config = RunConfig::default();
        assert!(config.state_manager().unwrap().is_in_memory());

        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            state_file: Some(dir.path().join("state.json")),
            ..Default::default()
        };
        let state = config.state_manager().unwrap();
        assert!(!state.is_in_memory());
        state.mark_completed("services", "661", 3, 1).await.unwrap();
        assert!(dir.path().join("state.json").exists());
    }
}
