//! Browser module
//!
//! The browsing collaborator the extraction engine drives.
//!
//! # Features
//!
//! - **Browser trait**: navigate, read the rendered page, inspect and trigger
//!   pagination controls
//! - **HTTP browser**: reqwest-backed implementation following link controls
//! - **Pacing**: minimum interval plus jitter between navigations (governor)
//! - **Sessions**: one browser per crawl target via [`BrowserFactory`]

mod http;
mod rate_limit;
#[cfg(test)]
pub(crate) mod scripted;
mod types;

pub use http::{HttpBrowser, HttpBrowserConfig, HttpBrowserConfigBuilder, HttpBrowserFactory};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use types::{
    parse_selector, inspect_control_in_html, Browser, BrowserFactory, ControlState, RenderedPage,
};

#[cfg(test)]
mod tests;
