//! Loader types
//!
//! Declarative site definition types for YAML parsing.

use crate::browser::{HttpBrowserConfig, RateLimiterConfig};
use crate::extract::{FieldSpec, ProfileFields};
use crate::types::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

// ============================================================================
// Site Definition
// ============================================================================

/// Top-level site definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SiteDefinition {
    /// Site name
    pub name: String,
    /// Definition version
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL, available to locators as `{{ base_url }}`
    pub base_url: String,
    /// Browser session configuration
    #[serde(default)]
    pub browser: BrowserDefinition,
    /// Extra headers sent with every navigation
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Paginated listings
    pub listings: Vec<ListingDefinition>,
    /// Seller profile pages
    #[serde(default)]
    pub profile: Option<ProfileDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl SiteDefinition {
    /// Get a listing by name
    pub fn listing(&self, name: &str) -> Option<&ListingDefinition> {
        self.listings.iter().find(|l| l.name == name)
    }

    /// Names of all listings, in definition order
    pub fn listing_names(&self) -> Vec<&str> {
        self.listings.iter().map(|l| l.name.as_str()).collect()
    }

    /// Listings a category crawl walks: every listing with a locator of its own
    /// that is not used by the profile
    pub fn category_listings(&self) -> Vec<&ListingDefinition> {
        let embedded: Vec<&str> = self
            .profile
            .as_ref()
            .map(ProfileDefinition::listing_refs)
            .unwrap_or_default();
        self.listings
            .iter()
            .filter(|l| l.locator.is_some() && !embedded.contains(&l.name.as_str()))
            .collect()
    }

    /// HTTP browser configuration for this site
    pub fn browser_config(&self) -> HttpBrowserConfig {
        let mut builder = HttpBrowserConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.browser.timeout_secs))
            .rate_limit(RateLimiterConfig::new(
                Duration::from_millis(self.browser.min_interval_ms),
                Duration::from_millis(self.browser.jitter_ms),
            ));
        if let Some(agent) = &self.browser.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

// ============================================================================
// Browser Definition
// ============================================================================

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BrowserDefinition {
    /// Navigation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Minimum delay between two navigations, in milliseconds
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    /// Upper bound of the random delay added on top, in milliseconds
    #[serde(default = "default_jitter")]
    pub jitter_ms: u64,
    /// User agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BrowserDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            min_interval_ms: default_min_interval(),
            jitter_ms: default_jitter(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_min_interval() -> u64 {
    500
}

fn default_jitter() -> u64 {
    1000
}

// ============================================================================
// Listing Definition
// ============================================================================

/// A paginated listing and how to read it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListingDefinition {
    /// Listing name, also the output file stem and the resume job name
    pub name: String,
    /// Record shape of every row
    pub kind: RecordKind,
    /// Start locator template; absent for listings embedded in a profile page
    #[serde(default)]
    pub locator: Option<String>,
    /// Template variable each target binds (e.g. `category_id`)
    #[serde(default)]
    pub variable: Option<String>,
    /// Default targets when none are given on the command line
    #[serde(default)]
    pub targets: Vec<String>,
    /// Primary, structured extraction
    pub extract: SelectorDefinition,
    /// Text fallback, used when the primary strategy finds nothing
    #[serde(default)]
    pub fallback: Option<PatternDefinition>,
    /// Pagination control; absent means a single page
    #[serde(default)]
    pub pagination: Option<PaginationDefinition>,
    /// Page limit
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Records per checkpoint batch
    #[serde(default)]
    pub checkpoint_every: Option<usize>,
    /// Drop duplicate records across targets
    #[serde(default)]
    pub dedup: bool,
}

/// Structured extraction: one record per container
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectorDefinition {
    /// Selector of the record containers
    pub container: String,
    /// Field name to location inside a container
    pub fields: BTreeMap<String, FieldSpec>,
}

/// Text extraction with a regex over named groups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PatternDefinition {
    /// Selector of the record containers; absent means the whole page
    #[serde(default)]
    pub container: Option<String>,
    /// Regex with one named group per field
    pub pattern: String,
    /// Fields read with selectors instead of the pattern
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

/// Pagination control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaginationDefinition {
    /// Selector of the "next" control
    pub control: String,
    /// Query parameter carrying the page number.
    ///
    /// When set, the control only tells whether a next page exists; the
    /// page itself is loaded by bumping this parameter in the URL. Needed
    /// for pagers made of script buttons without links.
    #[serde(default)]
    pub page_param: Option<String>,
    /// Selector of the active page number, used to confirm progress
    #[serde(default)]
    pub page_marker: Option<String>,
}

// ============================================================================
// Profile Definition
// ============================================================================

/// Seller profile pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfileDefinition {
    /// Profile locator template (e.g. `{{ base_url }}/@{{ seller }}`)
    pub locator: String,
    /// Template variable holding the seller name
    #[serde(default = "default_seller_variable")]
    pub variable: String,
    /// Fields read from the profile page
    #[serde(default)]
    pub fields: ProfileFields,
    /// Listing of reviews, paginated on the profile page
    #[serde(default)]
    pub reviews: Option<String>,
    /// Listing of the seller's services
    #[serde(default)]
    pub services: Option<String>,
    /// Listing whose `seller` column feeds profile crawls
    #[serde(default)]
    pub sellers_from: Option<String>,
}

fn default_seller_variable() -> String {
    "seller".to_string()
}

impl ProfileDefinition {
    /// Names of the listings this profile refers to
    pub fn listing_refs(&self) -> Vec<&str> {
        self.reviews
            .iter()
            .chain(self.services.iter())
            .map(String::as_str)
            .collect()
    }
}
