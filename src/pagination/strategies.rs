//! Pagination strategy implementations
//!
//! Each strategy handles a specific way of reaching the next page.

use super::types::{AdvanceOutcome, Advancer};
use crate::browser::{inspect_control_in_html, Browser};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

// ============================================================================
// Progress Signal
// ============================================================================

/// What tells us a triggered control actually moved to another page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProgressSignal {
    /// Text of the active page number element (e.g. `.pagination .active`)
    PageMarker(String),
    /// The page URL
    Locator,
    /// A digest of the rendered HTML
    #[default]
    Content,
}

impl ProgressSignal {
    async fn token(&self, browser: &dyn Browser) -> Option<String> {
        let page = browser.current_page().await.ok()?;
        match self {
            Self::PageMarker(selector) => match page.marker_text(selector) {
                Ok(Some(marker)) => Some(marker),
                // Marker missing: the URL is all we have left
                Ok(None) => Some(format!("url:{}", page.url)),
                Err(e) => {
                    warn!("Page marker unusable: {e}");
                    Some(format!("url:{}", page.url))
                }
            },
            Self::Locator => Some(page.url),
            Self::Content => {
                let mut hasher = DefaultHasher::new();
                page.html.hash(&mut hasher);
                Some(format!("{:016x}", hasher.finish()))
            }
        }
    }

    /// Compare the signal after a move with the one taken before it
    async fn confirm(
        &self,
        browser: &dyn Browser,
        before: Option<String>,
        action: &str,
    ) -> AdvanceOutcome {
        match (before, self.token(browser).await) {
            (_, None) => {
                warn!("No page after {action}");
                AdvanceOutcome::NavigationFailed
            }
            (Some(before), Some(after)) if before == after => {
                warn!("{action} did not change the page ({before})");
                AdvanceOutcome::NavigationFailed
            }
            _ => {
                debug!("Advanced by {action}");
                AdvanceOutcome::Advanced
            }
        }
    }
}

// ============================================================================
// Next Control
// ============================================================================

/// Pagination through a "next" control on the page
///
/// Inspects the control, treats a disabled control like a missing one,
/// triggers it, and verifies that the page actually changed. A trigger
/// that leaves the progress signal untouched is reported as
/// [`AdvanceOutcome::NavigationFailed`].
#[derive(Debug, Clone)]
pub struct NextControlAdvancer {
    /// CSS selector of the control
    pub control: String,
    /// Progress check after triggering
    pub progress: ProgressSignal,
}

impl NextControlAdvancer {
    /// Create a new next-control advancer
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            progress: ProgressSignal::default(),
        }
    }

    /// Set the progress signal
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSignal) -> Self {
        self.progress = progress;
        self
    }

    /// Use the active page marker as progress signal
    #[must_use]
    pub fn with_page_marker(self, selector: impl Into<String>) -> Self {
        self.with_progress(ProgressSignal::PageMarker(selector.into()))
    }
}

#[async_trait]
impl Advancer for NextControlAdvancer {
    async fn advance(&self, browser: &mut dyn Browser) -> AdvanceOutcome {
        let found = match browser.inspect_control(&self.control).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Inspecting '{}' failed: {e}", self.control);
                return AdvanceOutcome::NavigationFailed;
            }
        };

        match found {
            None => return AdvanceOutcome::NoControlFound,
            Some(found) if !found.enabled => return AdvanceOutcome::Disabled,
            Some(_) => {}
        }

        let before = self.progress.token(browser).await;

        if let Err(e) = browser.trigger_control(&self.control).await {
            warn!("Triggering '{}' failed: {e}", self.control);
            return AdvanceOutcome::NavigationFailed;
        }

        self.progress
            .confirm(browser, before, &format!("triggering '{}'", self.control))
            .await
    }
}

// ============================================================================
// Page Parameter
// ============================================================================

/// Pagination by rewriting a page-number query parameter
///
/// For pagers driven by scripts: the control is only inspected to learn
/// whether a next page exists, and the next page is loaded by navigating
/// to the current URL with `param` set to the following page number. A
/// missing parameter counts as page 1.
#[derive(Debug, Clone)]
pub struct PageParamAdvancer {
    /// Query parameter holding the page number
    pub param: String,
    /// CSS selector of the "next" control
    pub control: String,
    /// Progress check after navigating
    pub progress: ProgressSignal,
}

impl PageParamAdvancer {
    /// Create a new page-parameter advancer
    pub fn new(param: impl Into<String>, control: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            control: control.into(),
            progress: ProgressSignal::Locator,
        }
    }

    /// Set the progress signal
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSignal) -> Self {
        self.progress = progress;
        self
    }

    /// `url` with the page parameter moved one page forward
    pub fn next_locator(&self, url: &str) -> Option<String> {
        let mut url = Url::parse(url).ok()?;
        let mut page = 1u32;
        let mut others = Vec::new();
        for (key, value) in url.query_pairs() {
            if key == self.param.as_str() {
                page = value.trim().parse().ok()?;
            } else {
                others.push((key.into_owned(), value.into_owned()));
            }
        }

        let next = page.checked_add(1)?.to_string();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(&others)
            .append_pair(&self.param, &next);
        Some(url.to_string())
    }
}

#[async_trait]
impl Advancer for PageParamAdvancer {
    async fn advance(&self, browser: &mut dyn Browser) -> AdvanceOutcome {
        let page = match browser.current_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("No page to advance from: {e}");
                return AdvanceOutcome::NavigationFailed;
            }
        };

        // Read the pager from the markup; the control itself is never followed
        match inspect_control_in_html(&page.html, &self.control) {
            Ok(None) => return AdvanceOutcome::NoControlFound,
            Ok(Some(found)) if !found.enabled => return AdvanceOutcome::Disabled,
            Ok(Some(_)) => {}
            Err(e) => {
                warn!("Inspecting '{}' failed: {e}", self.control);
                return AdvanceOutcome::NavigationFailed;
            }
        }

        let Some(next) = self.next_locator(&page.url) else {
            warn!("Cannot move '{}' forward in {}", self.param, page.url);
            return AdvanceOutcome::NavigationFailed;
        };

        let before = self.progress.token(browser).await;
        if let Err(e) = browser.navigate(&next).await {
            warn!("Loading {next} failed: {e}");
            return AdvanceOutcome::NavigationFailed;
        }

        self.progress
            .confirm(browser, before, &format!("loading {next}"))
            .await
    }
}

// ============================================================================
// Single Page
// ============================================================================

/// No pagination - a single page
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePageAdvancer;

#[async_trait]
impl Advancer for SinglePageAdvancer {
    async fn advance(&self, _browser: &mut dyn Browser) -> AdvanceOutcome {
        AdvanceOutcome::NoControlFound
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Wraps an advancer and stops pagination once a shared flag is raised
///
/// Cancellation reads as a disabled control: the engine ends the loop
/// normally and flushes what it has.
#[derive(Debug, Clone)]
pub struct CancellableAdvancer<A> {
    inner: A,
    cancelled: Arc<AtomicBool>,
}

impl<A> CancellableAdvancer<A> {
    /// Wrap `inner`, watching `cancelled`
    pub fn new(inner: A, cancelled: Arc<AtomicBool>) -> Self {
        Self { inner, cancelled }
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<A: Advancer> Advancer for CancellableAdvancer<A> {
    async fn advance(&self, browser: &mut dyn Browser) -> AdvanceOutcome {
        if self.is_cancelled() {
            debug!("Pagination cancelled");
            return AdvanceOutcome::Disabled;
        }
        self.inner.advance(browser).await
    }
}

#[async_trait]
impl Advancer for Box<dyn Advancer> {
    async fn advance(&self, browser: &mut dyn Browser) -> AdvanceOutcome {
        self.as_ref().advance(browser).await
    }
}
