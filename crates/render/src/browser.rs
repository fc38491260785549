use crate::error::{ErrorKind, Result};
use crate::usage::{self, StyleSheet, TrackedRule};
use crate::{CoverageEntry, Launcher, NavigateOptions, Renderer, Viewport, WaitUntil};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::css::{
    self, CssStyleSheetHeader, EventStyleSheetAdded, GetStyleSheetTextParams, StartRuleUsageTrackingParams,
    StopRuleUsageTrackingParams, StyleSheetId,
};
use chromiumoxide::cdp::browser_protocol::dom;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, SetLifecycleEventsEnabledParams};
use chromiumoxide::listeners::EventStream;
use exn::ResultExt;
use futures::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::instrument;

const NETWORK_IDLE_EVENT: &str = "networkIdle";
const NAVIGATION_INIT_EVENT: &str = "init";

/// Starts headless Chrome/Chromium processes.
#[derive(Clone, Debug)]
pub struct ChromeLauncher {
    executable: PathBuf,
    sandbox: bool,
}

impl ChromeLauncher {
    /// Finds a browser binary, preferring `configured` when it exists.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        Ok(Self::with_executable(crate::chrome::discover(configured)?))
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            sandbox: false,
        }
    }

    /// Runs Chrome with its process sandbox enabled. Off by default so the
    /// scanner works inside containers and as root.
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    type Renderer = ChromeRenderer;

    #[instrument(skip_all, fields(executable = %self.executable.display()))]
    async fn launch(&self) -> Result<ChromeRenderer> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .arg("--hide-scrollbars")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-sync");
        if !self.sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(|reason| exn::Exn::from(ErrorKind::Launch(reason)))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .or_raise(|| ErrorKind::Launch(self.executable.display().to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "Browser event error");
                }
            }
        });
        let page = browser
            .new_page("about:blank")
            .await
            .or_raise(|| ErrorKind::Launch("could not open a page".to_string()))?;
        tracing::info!("Browser launched");
        Ok(ChromeRenderer {
            browser,
            page,
            handler,
            stylesheets: None,
            headers: Vec::new(),
        })
    }
}

/// A single Chrome tab driven over the DevTools protocol.
pub struct ChromeRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    stylesheets: Option<EventStream<EventStyleSheetAdded>>,
    /// Stylesheet headers in the order Chrome reported them.
    headers: Vec<CssStyleSheetHeader>,
}

impl ChromeRenderer {
    fn drain_stylesheet_events(&mut self) {
        let Some(events) = self.stylesheets.as_mut() else {
            return;
        };
        while let Some(Some(event)) = events.next().now_or_never() {
            self.headers.push(event.header.clone());
        }
    }

    async fn stylesheet_text(&self, id: &str) -> Result<String> {
        let response = self
            .page
            .execute(GetStyleSheetTextParams::new(StyleSheetId::new(id)))
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        Ok(response.result.text)
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn start_coverage(&mut self) -> Result<()> {
        // Subscribe first: enabling the CSS domain replays existing stylesheets.
        let events = self
            .page
            .event_listener::<EventStyleSheetAdded>()
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        self.stylesheets = Some(events);
        self.headers.clear();
        self.page
            .execute(dom::EnableParams::default())
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        self.page
            .execute(css::EnableParams::default())
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        self.page
            .execute(StartRuleUsageTrackingParams::default())
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        Ok(())
    }

    async fn stop_coverage(&mut self) -> Result<Vec<CoverageEntry>> {
        let response = self
            .page
            .execute(StopRuleUsageTrackingParams::default())
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        self.drain_stylesheet_events();
        self.stylesheets = None;

        let rules = response
            .result
            .rule_usage
            .iter()
            .map(|rule| TrackedRule {
                sheet: rule.style_sheet_id.inner().clone(),
                start: rule.start_offset,
                end: rule.end_offset,
                used: rule.used,
            })
            .collect::<Vec<_>>();
        let sheets = std::mem::take(&mut self.headers)
            .into_iter()
            .map(|header| StyleSheet {
                id: header.style_sheet_id.inner().clone(),
                source_url: header.source_url,
                is_inline: header.is_inline,
            })
            .collect::<Vec<_>>();

        let mut texts = HashMap::new();
        for sheet in &sheets {
            if texts.contains_key(&sheet.id) {
                continue;
            }
            match self.stylesheet_text(&sheet.id).await {
                Ok(text) => {
                    texts.insert(sheet.id.clone(), text);
                },
                Err(err) => {
                    tracing::debug!(stylesheet = %sheet.id, error = %err, "Stylesheet removed before its text was read");
                },
            }
        }
        Ok(usage::coverage_entries(&sheets, &rules, &texts))
    }

    #[instrument(skip(self, options), fields(wait_until = ?options.wait_until))]
    async fn goto(&mut self, url: &str, options: &NavigateOptions) -> Result<()> {
        let mut lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .or_raise(|| ErrorKind::Protocol)?;
        let page = &self.page;
        let navigation = async move {
            page.goto(url).await.or_raise(|| ErrorKind::Navigation(url.to_string()))?;
            if options.wait_until == WaitUntil::NetworkIdle {
                let mut navigating = false;
                while let Some(event) = lifecycle.next().await {
                    navigating |= event.name == NAVIGATION_INIT_EVENT;
                    if navigating && event.name == NETWORK_IDLE_EVENT {
                        break;
                    }
                }
            }
            Ok::<_, crate::error::Error>(())
        };
        tokio::time::timeout(options.timeout, navigation)
            .await
            .or_raise(|| ErrorKind::Navigation(url.to_string()))?
    }

    async fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(viewport.width), i64::from(viewport.height), 1.0, false);
        self.page.execute(params).await.or_raise(|| ErrorKind::Protocol)?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate_expression(script)
            .await
            .or_raise(|| ErrorKind::Evaluate)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(&mut self) -> Result<()> {
        self.browser.close().await.or_raise(|| ErrorKind::Protocol)?;
        if let Err(err) = self.browser.wait().await {
            tracing::debug!(error = %err, "Browser process did not exit cleanly");
        }
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }
}
