//! Target source implementations
//!
//! Each source produces crawl targets from a specific kind of input.

use super::types::{unique_in_order, Target, TargetSource};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// List Source
// ============================================================================

/// Static list of values
///
/// Duplicates and blanks are dropped, first occurrence wins.
#[derive(Debug, Clone)]
pub struct ListSource {
    values: Vec<String>,
    variable: String,
}

impl ListSource {
    /// Create a new list source
    pub fn new<S: AsRef<str>>(
        values: impl IntoIterator<Item = S>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            values: unique_in_order(values),
            variable: variable.into(),
        }
    }
}

impl TargetSource for ListSource {
    fn targets(&self) -> Result<Vec<Target>> {
        Ok(self
            .values
            .iter()
            .map(|v| Target::bound(self.variable.clone(), v.clone()))
            .collect())
    }

    fn variable(&self) -> &str {
        &self.variable
    }
}

// ============================================================================
// CSV Column Source
// ============================================================================

/// One column of a CSV file written by an earlier run
///
/// Reads the file with or without a byte-order mark and yields the unique
/// values of the column in first-seen order.
#[derive(Debug, Clone)]
pub struct CsvColumnSource {
    path: PathBuf,
    column: String,
    variable: String,
}

impl CsvColumnSource {
    /// Create a new CSV column source
    pub fn new(
        path: impl AsRef<Path>,
        column: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            column: column.into(),
            variable: variable.into(),
        }
    }

    /// Values of the column, in file order, duplicates removed
    pub fn values(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Err(Error::FileNotFound {
                path: self.path.display().to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let index = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == self.column)
            .ok_or_else(|| {
                Error::config(format!(
                    "column '{}' not found in {} (columns: {})",
                    self.column,
                    self.path.display(),
                    headers
                        .iter()
                        .map(|h| h.trim_start_matches('\u{feff}'))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        let mut raw = Vec::new();
        for row in reader.records() {
            let row = row?;
            if let Some(value) = row.get(index) {
                raw.push(value.to_string());
            }
        }
        let values = unique_in_order(raw);
        debug!(
            "{} unique values in column '{}' of {}",
            values.len(),
            self.column,
            self.path.display()
        );
        Ok(values)
    }
}

impl TargetSource for CsvColumnSource {
    fn targets(&self) -> Result<Vec<Target>> {
        Ok(self
            .values()?
            .into_iter()
            .map(|v| Target::bound(self.variable.clone(), v))
            .collect())
    }

    fn variable(&self) -> &str {
        &self.variable
    }
}
