//! Browser types and traits
//!
//! Defines the browsing collaborator the engine drives, plus the helpers
//! that read pagination controls out of rendered HTML.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

/// A page as the browser rendered it
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status (200 for pages that did not come over HTTP)
    pub status: u16,
    /// Rendered HTML
    pub html: String,
    /// When the page was captured
    pub fetched_at: DateTime<Utc>,
}

impl RenderedPage {
    /// Create a page captured now
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            html: html.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Set the HTTP status
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Parse the HTML into a document.
    ///
    /// The document is not `Send`; keep it out of `.await` points.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Text of the last element matching `selector`, used as a progress marker
    pub fn marker_text(&self, selector: &str) -> Result<Option<String>> {
        let selector = parse_selector(selector)?;
        let document = self.document();
        Ok(document
            .select(&selector)
            .last()
            .map(|el| crate::types::normalize_text(&el.text().collect::<String>())))
    }
}

/// What a pagination control looked like when inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    /// Whether the control can be triggered
    pub enabled: bool,
    /// Link the control points at, if any
    pub target: Option<String>,
}

impl ControlState {
    /// An enabled control
    pub fn enabled(target: Option<String>) -> Self {
        Self {
            enabled: true,
            target,
        }
    }

    /// A control that exists but is disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            target: None,
        }
    }
}

/// The browsing collaborator driven by the engine.
///
/// One instance is owned by one crawl target at a time. Implementations
/// must not retry; a failed navigation is reported once and the caller
/// decides what to do with it.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load a locator (usually a URL)
    async fn navigate(&mut self, locator: &str) -> Result<()>;

    /// The currently rendered page
    async fn current_page(&self) -> Result<RenderedPage>;

    /// Look for the pagination control matching `selector` on the current page.
    ///
    /// `None` means the control does not exist.
    async fn inspect_control(&self, selector: &str) -> Result<Option<ControlState>>;

    /// Trigger the pagination control matching `selector`
    async fn trigger_control(&mut self, selector: &str) -> Result<()>;

    /// Release the session
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates one browser session per crawl target
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    /// Acquire a fresh session
    async fn launch(&self) -> Result<Box<dyn Browser>>;
}

/// Parse a CSS selector, mapping the error into ours
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::selector(selector, format!("{e:?}")))
}

/// Inspect a pagination control in raw HTML.
///
/// When several elements match, the last one wins, matching the usual
/// "last button in the pager is next" layout.
pub fn inspect_control_in_html(html: &str, selector: &str) -> Result<Option<ControlState>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let Some(control) = document.select(&selector).last() else {
        return Ok(None);
    };

    if is_disabled(&control) {
        return Ok(Some(ControlState::disabled()));
    }

    Ok(Some(ControlState::enabled(control_target(&control))))
}

fn is_disabled(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("disabled").is_some() {
        return true;
    }
    if value
        .attr("aria-disabled")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    if value.attr("tabindex").is_some_and(|v| v.trim() == "-1") {
        return true;
    }
    value.classes().any(|c| c == "disabled")
}

fn control_target(element: &ElementRef<'_>) -> Option<String> {
    if let Some(href) = element.value().attr("href") {
        return usable_href(href);
    }

    // Buttons wrapping a link, or list items holding the anchor
    let anchor = Selector::parse("a[href]").ok()?;
    element
        .select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(usable_href)
}

fn usable_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == "#" || href.starts_with("javascript:") {
        None
    } else {
        Some(href.to_string())
    }
}
