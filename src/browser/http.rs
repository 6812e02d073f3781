//! HTTP-backed browser
//!
//! Renders pages by fetching them with reqwest. Triggering a pagination
//! control means following the link it points at, so this browser works
//! for listings whose "next" control is a real link. Script-driven
//! controls need a different [`Browser`] implementation.
//!
//! There is no retry loop: a failed request is reported once and the
//! engine ends that target's pagination.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::types::{inspect_control_in_html, Browser, BrowserFactory, ControlState, RenderedPage};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the HTTP browser
#[derive(Debug, Clone)]
pub struct HttpBrowserConfig {
    /// Base URL used to resolve relative locators
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Navigation pacing
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpBrowserConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(10),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("market-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpBrowserConfig {
    /// Create a new config builder
    pub fn builder() -> HttpBrowserConfigBuilder {
        HttpBrowserConfigBuilder::default()
    }
}

/// Builder for HTTP browser config
#[derive(Default)]
pub struct HttpBrowserConfigBuilder {
    config: HttpBrowserConfig,
}

impl HttpBrowserConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set navigation pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable pacing
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpBrowserConfig {
        self.config
    }
}

/// Browser session over plain HTTP
pub struct HttpBrowser {
    client: Client,
    config: HttpBrowserConfig,
    rate_limiter: Option<RateLimiter>,
    current: Option<RenderedPage>,
}

impl HttpBrowser {
    /// Create a new browser with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpBrowserConfig::default())
    }

    /// Create a new browser with custom configuration
    pub fn with_config(config: HttpBrowserConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
            current: None,
        })
    }

    /// Whether navigations are paced
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.as_ref().is_some_and(RateLimiter::is_enabled)
    }

    /// Resolve a locator against the current page, then the base URL
    pub fn resolve(&self, locator: &str) -> Result<String> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return Ok(locator.to_string());
        }

        if let Some(page) = &self.current {
            return Ok(Url::parse(&page.url)?.join(locator)?.to_string());
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = locator.trim_start_matches('/');
                Ok(format!("{base}/{path}"))
            }
            None => Err(Error::navigation(
                locator,
                "relative locator without a base URL",
            )),
        }
    }

    async fn fetch(&mut self, url: &str) -> Result<()> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("Loaded {} ({} bytes)", final_url, html.len());

        self.current = Some(RenderedPage::new(final_url, html).with_status(status.as_u16()));
        Ok(())
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, locator: &str) -> Result<()> {
        // A fresh navigation never resolves against the previous page
        self.current = None;
        let url = self.resolve(locator)?;
        self.fetch(&url).await
    }

    async fn current_page(&self) -> Result<RenderedPage> {
        self.current.clone().ok_or(Error::NoPage)
    }

    async fn inspect_control(&self, selector: &str) -> Result<Option<ControlState>> {
        let page = self.current.as_ref().ok_or(Error::NoPage)?;
        let found = inspect_control_in_html(&page.html, selector)?;

        // A control with nowhere to go cannot be followed over HTTP
        Ok(found.map(|p| {
            if p.enabled && p.target.is_none() {
                ControlState::disabled()
            } else {
                p
            }
        }))
    }

    async fn trigger_control(&mut self, selector: &str) -> Result<()> {
        let found = self
            .inspect_control(selector)
            .await?
            .ok_or_else(|| Error::ControlNotFound {
                selector: selector.to_string(),
            })?;

        let target = match found {
            ControlState {
                enabled: true,
                target: Some(target),
            } => target,
            _ => {
                return Err(Error::ControlDisabled {
                    selector: selector.to_string(),
                })
            }
        };

        let url = self.resolve(&target)?;
        self.fetch(&url).await
    }

    async fn close(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}

impl std::fmt::Debug for HttpBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBrowser")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.has_rate_limiter())
            .field("current", &self.current.as_ref().map(|p| p.url.as_str()))
            .finish_non_exhaustive()
    }
}

/// Launches [`HttpBrowser`] sessions sharing one configuration
#[derive(Debug, Clone, Default)]
pub struct HttpBrowserFactory {
    config: HttpBrowserConfig,
}

impl HttpBrowserFactory {
    /// Create a factory
    pub fn new(config: HttpBrowserConfig) -> Self {
        Self { config }
    }

    /// The configuration every session gets
    pub fn config(&self) -> &HttpBrowserConfig {
        &self.config
    }
}

#[async_trait]
impl BrowserFactory for HttpBrowserFactory {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        Ok(Box::new(HttpBrowser::with_config(self.config.clone())?))
    }
}
