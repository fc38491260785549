//! The browser side of a coverage scan.
//!
//! [`Renderer`] is the seam between the crawl engine and whatever actually
//! paints pages. [`ChromeLauncher`] starts a headless Chrome/Chromium through
//! the DevTools protocol and hands out a [`ChromeRenderer`]; the `mock`
//! feature provides a scripted [`MockRenderer`] for tests.
//!
//! [`collect`] drives one renderer through the fixed viewport sweep for a
//! single page visit and returns the raw per-stylesheet coverage.

mod browser;
mod chrome;
mod collect;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod usage;
mod viewport;

pub use crate::browser::{ChromeLauncher, ChromeRenderer};
pub use crate::collect::{CollectOptions, collect};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{Call, MockRenderer};
pub use crate::viewport::{VIEWPORTS, Viewport};
pub use csscan_coverage::CoverageEntry;

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::time::Duration;

pub(crate) const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
pub(crate) const SCROLL_TO_TOP_SCRIPT: &str = "window.scrollTo(0, 0)";
pub(crate) const EXTRACT_LINKS_SCRIPT: &str =
    "Array.from(document.querySelectorAll('a')).map(a => a.href).filter(href => href.startsWith('http'))";

/// When a navigation counts as finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    /// The `load` event fired and the network has since gone quiet.
    #[default]
    NetworkIdle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

/// A single browser page that can be instrumented for stylesheet usage.
///
/// All methods act on the same page. Coverage started with
/// [`start_coverage`](Self::start_coverage) survives navigation until
/// [`stop_coverage`](Self::stop_coverage) is called.
#[async_trait]
pub trait Renderer: Send {
    async fn start_coverage(&mut self) -> Result<()>;

    /// Stops instrumentation and returns one entry per stylesheet seen since
    /// [`start_coverage`](Self::start_coverage), including stylesheets with no
    /// used rules at all.
    async fn stop_coverage(&mut self) -> Result<Vec<CoverageEntry>>;

    /// Navigates the page, failing with [`ErrorKind::Navigation`] on network
    /// errors or when `options.timeout` elapses.
    async fn goto(&mut self, url: &str, options: &NavigateOptions) -> Result<()>;

    async fn set_viewport(&mut self, viewport: &Viewport) -> Result<()>;

    /// Evaluates a JavaScript expression in the page and returns its value
    /// (`null` for `undefined`).
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Releases the browser. The renderer must not be used afterwards.
    async fn close(&mut self) -> Result<()>;

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.evaluate(SCROLL_TO_BOTTOM_SCRIPT).await.map(|_| ())
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        self.evaluate(SCROLL_TO_TOP_SCRIPT).await.map(|_| ())
    }

    /// Absolute `href`s of every anchor on the page that start with `http`.
    async fn extract_links(&mut self) -> Result<Vec<String>> {
        let value = self.evaluate(EXTRACT_LINKS_SCRIPT).await?;
        serde_json::from_value(value).or_raise(|| ErrorKind::Evaluate)
    }
}

/// Acquires a [`Renderer`] for the duration of one scan.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Renderer: Renderer;

    async fn launch(&self) -> Result<Self::Renderer>;
}
