//! Scripted renderer for testing.

use crate::error::{ErrorKind, Result};
use crate::{CoverageEntry, Launcher, NavigateOptions, Renderer, Viewport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A renderer call, as recorded by [`MockRenderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Launch,
    StartCoverage,
    StopCoverage,
    Goto(String),
    SetViewport(Viewport),
    ScrollToBottom,
    ScrollToTop,
    ExtractLinks,
    Evaluate(String),
    Close,
}

#[derive(Clone, Debug, Default)]
struct MockPage {
    entries: Vec<CoverageEntry>,
    links: Vec<String>,
    fail_navigation: bool,
    fail_coverage: bool,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, MockPage>,
    current: Option<String>,
    fail_launch: bool,
    calls: Vec<Call>,
}
impl State {
    fn current_page(&self) -> MockPage {
        self.current.as_ref().and_then(|url| self.pages.get(url)).cloned().unwrap_or_default()
    }
}

/// In-memory renderer that serves scripted coverage and links per URL.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// code under test owns another (the [`Launcher`] impl hands out clones of
/// itself). URLs that were never scripted load as empty pages.
#[derive(Clone, Debug, Default)]
pub struct MockRenderer {
    state: Arc<Mutex<State>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the stylesheets reported for `url` and the links found on it.
    pub fn with_page(
        self,
        url: impl Into<String>,
        entries: impl IntoIterator<Item = CoverageEntry>,
        links: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        {
            let mut state = self.lock();
            let page = state.pages.entry(url.into()).or_default();
            page.entries = entries.into_iter().collect();
            page.links = links.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Makes navigation to `url` fail. The page then reports no coverage.
    pub fn with_failing_navigation(self, url: impl Into<String>) -> Self {
        self.lock().pages.entry(url.into()).or_default().fail_navigation = true;
        self
    }

    /// Makes `stop_coverage` fail after navigating to `url`.
    pub fn with_failing_coverage(self, url: impl Into<String>) -> Self {
        self.lock().pages.entry(url.into()).or_default().fail_coverage = true;
        self
    }

    /// Makes [`Launcher::launch`] fail.
    pub fn with_failing_launch(self) -> Self {
        self.lock().fail_launch = true;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// URLs navigated to, in order.
    pub fn visited(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Goto(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().calls.contains(&Call::Close)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not hide its own assertions behind poisoning.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn start_coverage(&mut self) -> Result<()> {
        self.record(Call::StartCoverage);
        Ok(())
    }

    async fn stop_coverage(&mut self) -> Result<Vec<CoverageEntry>> {
        self.record(Call::StopCoverage);
        let page = self.lock().current_page();
        if page.fail_coverage {
            exn::bail!(ErrorKind::Protocol);
        }
        if page.fail_navigation {
            return Ok(Vec::new());
        }
        Ok(page.entries)
    }

    async fn goto(&mut self, url: &str, _options: &NavigateOptions) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Goto(url.to_string()));
        state.current = Some(url.to_string());
        if state.current_page().fail_navigation {
            exn::bail!(ErrorKind::Navigation(url.to_string()));
        }
        Ok(())
    }

    async fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        self.record(Call::SetViewport(*viewport));
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
        self.record(Call::Evaluate(script.to_string()));
        Ok(serde_json::Value::Null)
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.record(Call::ScrollToBottom);
        Ok(())
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        self.record(Call::ScrollToTop);
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.calls.push(Call::ExtractLinks);
        let page = state.current_page();
        if page.fail_navigation {
            return Ok(Vec::new());
        }
        Ok(page.links)
    }
}

#[async_trait]
impl Launcher for MockRenderer {
    type Renderer = MockRenderer;

    async fn launch(&self) -> Result<MockRenderer> {
        self.record(Call::Launch);
        if self.lock().fail_launch {
            exn::bail!(ErrorKind::Launch("mock launch failure".to_string()));
        }
        Ok(self.clone())
    }
}
