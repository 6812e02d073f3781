//! Scripted browser for tests
//!
//! Serves a fixed sequence of pages. The "next" control is enabled on
//! every page except the last, where it is disabled.

use super::types::{Browser, ControlState, RenderedPage};
use crate::error::{Error, Result};
use async_trait::async_trait;

/// In-memory browser walking through a list of pages
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    pages: Vec<String>,
    index: Option<usize>,
    /// Triggering the control leaves the page as it is
    pub stuck: bool,
    /// Pages carry no control at all
    pub no_controls: bool,
    /// The first navigation fails
    pub fail_navigation: bool,
    /// Number of successful triggers
    pub triggers: usize,
    /// Number of navigations
    pub navigations: usize,
    /// Whether `close` was called
    pub closed: bool,
}

impl ScriptedBrowser {
    /// Serve these HTML bodies in order
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// `n` pages each containing one `<li>` item named after the page
    pub fn numbered(n: usize) -> Self {
        Self::new(
            (1..=n)
                .map(|i| format!("<ul><li class='item'>item-{i}</li></ul><b class='page'>{i}</b>"))
                .collect(),
        )
    }

    /// Triggering does nothing
    #[must_use]
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    /// No pagination control anywhere
    #[must_use]
    pub fn without_controls(mut self) -> Self {
        self.no_controls = true;
        self
    }

    /// Start navigation fails
    #[must_use]
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    fn current_index(&self) -> Result<usize> {
        self.index.ok_or(Error::NoPage)
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&mut self, locator: &str) -> Result<()> {
        self.navigations += 1;
        if self.fail_navigation {
            return Err(Error::navigation(locator, "scripted failure"));
        }
        self.index = Some(0);
        Ok(())
    }

    async fn current_page(&self) -> Result<RenderedPage> {
        let index = self.current_index()?;
        let html = self.pages.get(index).cloned().unwrap_or_default();
        Ok(RenderedPage::new(
            format!("https://market.test/list?page={}", index + 1),
            format!("<html><body>{html}</body></html>"),
        ))
    }

    async fn inspect_control(&self, _selector: &str) -> Result<Option<ControlState>> {
        let index = self.current_index()?;
        if self.no_controls {
            return Ok(None);
        }
        if index + 1 < self.pages.len() {
            Ok(Some(ControlState::enabled(Some(format!(
                "?page={}",
                index + 2
            )))))
        } else {
            Ok(Some(ControlState::disabled()))
        }
    }

    async fn trigger_control(&mut self, selector: &str) -> Result<()> {
        let index = self.current_index()?;
        if self.stuck {
            self.triggers += 1;
            return Ok(());
        }
        if index + 1 >= self.pages.len() {
            return Err(Error::ControlDisabled {
                selector: selector.to_string(),
            });
        }
        self.index = Some(index + 1);
        self.triggers += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
