use crate::error::Result;
use crate::{CoverageEntry, NavigateOptions, Renderer, VIEWPORTS, WaitUntil};
use std::time::Duration;
use tracing::instrument;

/// Timing knobs for a single page visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectOptions {
    /// Upper bound on navigation, including waiting for network idle.
    pub navigation_timeout: Duration,
    /// Pause after each resize and each scroll so layout and lazy content
    /// can catch up.
    pub settle: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle: Duration::from_millis(200),
        }
    }
}

/// Visits `url` and returns the raw stylesheet coverage for that visit.
///
/// Coverage is recorded across the whole viewport sweep: the page is loaded
/// once at the first viewport, then resized through the rest, scrolling to the
/// bottom and back at every size to trigger lazily loaded content.
///
/// A failed or timed-out navigation is logged and otherwise ignored; the
/// entries reflect whatever the page managed to load. Every other renderer
/// failure is returned.
#[instrument(skip(renderer, options))]
pub async fn collect<R>(renderer: &mut R, url: &str, options: &CollectOptions) -> Result<Vec<CoverageEntry>>
where
    R: Renderer + ?Sized,
{
    renderer.start_coverage().await?;
    let navigate = NavigateOptions {
        wait_until: WaitUntil::NetworkIdle,
        timeout: options.navigation_timeout,
    };
    for (index, viewport) in VIEWPORTS.iter().enumerate() {
        tracing::debug!(viewport = viewport.label, "Resizing viewport");
        renderer.set_viewport(viewport).await?;
        if index == 0
            && let Err(err) = renderer.goto(url, &navigate).await
        {
            tracing::warn!(error = %err, "Navigation failed; continuing with partial coverage");
        }
        tokio::time::sleep(options.settle).await;
        renderer.scroll_to_bottom().await?;
        tokio::time::sleep(options.settle).await;
        renderer.scroll_to_top().await?;
    }
    let entries = renderer.stop_coverage().await?;
    tracing::debug!(stylesheets = entries.len(), "Coverage collected");
    Ok(entries)
}
