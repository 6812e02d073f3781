//! Partition types and traits
//!
//! Defines crawl targets and the sources that produce them.

use crate::error::Result;
use std::collections::BTreeMap;

/// One unit of crawl work: a category, a seller, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique identifier, used for resume state and logging
    pub id: String,
    /// Values to inject into locator templates
    pub vars: BTreeMap<String, String>,
}

impl Target {
    /// Create a target with no variables
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Create a target whose id is also bound to `variable`
    pub fn bound(variable: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone()).with_var(variable, id)
    }

    /// Add a template variable
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Trait for target sources
pub trait TargetSource: Send + Sync {
    /// Produce the targets, in crawl order
    fn targets(&self) -> Result<Vec<Target>>;

    /// Template variable each target binds
    fn variable(&self) -> &str;
}

/// Split `items` into at most `workers` contiguous chunks of near-equal size.
///
/// Sizes differ by at most one, larger chunks first; concatenating the
/// chunks gives back `items`.
pub fn chunk_contiguous<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, items.len());
    let base = items.len() / workers;
    let extra = items.len() % workers;

    let mut chunks = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let len = base + usize::from(i < extra);
        chunks.push(items[start..start + len].to_vec());
        start += len;
    }
    chunks
}

/// Unique non-empty values in first-seen order
pub fn unique_in_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}
