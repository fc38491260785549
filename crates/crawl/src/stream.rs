use crate::error::{ErrorKind, Result};
use crate::frontier::CrawlTask;
use crate::result::ScanResult;
use crate::session::ScanSession;
use async_stream::stream;
use csscan_coverage::format::CssFormatter;
use csscan_render::{CollectOptions, Launcher, Renderer, collect};
use exn::ResultExt;
use futures::Stream;
use std::path::PathBuf;

/// Parameters of a single scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// How many links away from the seed to follow; 0 scans only the seed.
    pub depth: u32,
    /// Upper bound on the number of pages visited.
    pub max_pages: usize,
    /// Directory that receives `used.css` and `unused.css`.
    pub output_dir: PathBuf,
    pub collect: CollectOptions,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            depth: 0,
            max_pages: 1,
            output_dir: PathBuf::from("."),
            collect: CollectOptions::default(),
        }
    }
}

/// Progress events emitted by [`scan`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, after the seed was accepted.
/// 2. [`PageVisited`](Self::PageVisited): once per page, before the page is
///    rendered.
/// 3. [`Complete`](Self::Complete): exactly once, after the artifacts were
///    written.
///
/// An error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanEvent {
    Started { seed: String },
    PageVisited { url: String, count: usize },
    Complete(ScanResult),
}

/// Crawls from `seed` and streams progress, ending in a [`ScanResult`].
///
/// Pages are visited one at a time, in breadth-first order, through a single
/// renderer acquired from `launcher`. The renderer is closed before the stream
/// ends, whether the crawl succeeded or not; the CSS artifacts are written
/// only after that, and only if every page visit succeeded.
pub fn scan<'a, L>(
    launcher: &'a L,
    seed: &'a str,
    options: &'a ScanOptions,
    formatter: &'a dyn CssFormatter,
) -> impl Stream<Item = Result<ScanEvent>> + 'a
where
    L: Launcher,
{
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let mut session = match ScanSession::new(seed, options.depth, options.max_pages) {
            Ok(session) => session,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ScanEvent::Started {
            seed: session.seed().to_string(),
        });

        let mut renderer = match launcher.launch().await.or_raise(|| ErrorKind::Browser) {
            Ok(renderer) => renderer,
            Err(e) => {
                yield Err(e);
                return;
            },
        };

        let mut failure = None;
        while let Some(task) = session.next_task() {
            yield Ok(ScanEvent::PageVisited {
                url: task.url.to_string(),
                count: session.pages_scanned(),
            });
            if let Err(e) = visit(&mut renderer, &mut session, &task, &options.collect).await {
                failure = Some(e);
                break;
            }
        }

        let closed = renderer.close().await.or_raise(|| ErrorKind::Browser);
        if let Some(e) = failure {
            if let Err(close_error) = closed {
                tracing::warn!(error = %close_error, "Browser did not close cleanly");
            }
            yield Err(e);
            return;
        }
        if let Err(e) = closed {
            yield Err(e);
            return;
        }

        yield session.finish(&options.output_dir, formatter).map(ScanEvent::Complete);
    })
}

async fn visit<R>(renderer: &mut R, session: &mut ScanSession, task: &CrawlTask, options: &CollectOptions) -> Result<()>
where
    R: Renderer,
{
    let url = task.url.as_str();
    let entries = collect(renderer, url, options).await.or_raise(|| ErrorKind::Collect(url.to_string()))?;
    session.absorb(entries);
    if session.wants_links(task.depth) {
        let links = renderer.extract_links().await.or_raise(|| ErrorKind::Collect(url.to_string()))?;
        session.discover(links, task.depth);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csscan_coverage::format::PrettyFormatter;
    use csscan_coverage::{ByteRange, CoverageEntry};
    use csscan_render::{Call, MockRenderer};
    use futures::StreamExt;
    use std::path::Path;
    use std::time::Duration;

    const SEED: &str = "https://example.com/";
    const STYLESHEET: &str = "https://example.com/site.css";

    fn options(depth: u32, max_pages: usize, output_dir: &Path) -> ScanOptions {
        ScanOptions {
            depth,
            max_pages,
            output_dir: output_dir.to_path_buf(),
            collect: CollectOptions {
                navigation_timeout: Duration::from_secs(30),
                settle: Duration::ZERO,
            },
        }
    }

    async fn run(mock: &MockRenderer, seed: &str, options: &ScanOptions) -> Vec<Result<ScanEvent>> {
        scan(mock, seed, options, &PrettyFormatter).collect().await
    }

    fn complete(events: &[Result<ScanEvent>]) -> &ScanResult {
        match events.last() {
            Some(Ok(ScanEvent::Complete(result))) => result,
            other => panic!("scan did not complete: {other:?}"),
        }
    }

    fn sheet(ranges: impl IntoIterator<Item = ByteRange>) -> CoverageEntry {
        CoverageEntry::new(STYLESHEET, "a{color:red}b{color:blue}\n", ranges)
    }

    #[tokio::test]
    async fn test_single_page_scan() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_page(SEED, [sheet([ByteRange::new(0, 12)])], Vec::<String>::new());

        let events = run(&mock, "https://example.com", &options(0, 1, temp_dir.path())).await;

        let result = complete(&events);
        assert_eq!(result.used_bytes, 12);
        assert_eq!(result.unused_bytes, 14);
        assert_eq!(result.unused_percentage, "53.85");
        assert_eq!(result.pages_scanned, 1);
        let used = std::fs::read_to_string(&result.artifacts.used).unwrap();
        assert_eq!(used, "/* used.css - scanned 1 pages */\na {\n  color:red\n}\n");
        assert!(mock.is_closed());
    }

    #[tokio::test]
    async fn test_event_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_page(SEED, [], ["https://example.com/about"]);

        let events = run(&mock, SEED, &options(1, 5, temp_dir.path())).await;

        let events: Vec<ScanEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ScanEvent::Started { seed: SEED.to_string() });
        assert_eq!(events[1], ScanEvent::PageVisited { url: SEED.to_string(), count: 1 });
        assert_eq!(
            events[2],
            ScanEvent::PageVisited {
                url: "https://example.com/about".to_string(),
                count: 2
            }
        );
        assert!(matches!(&events[3], ScanEvent::Complete(result) if result.scanned_urls == [SEED, "https://example.com/about"]));
    }

    #[tokio::test]
    async fn test_merges_coverage_across_pages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new()
            .with_page(SEED, [sheet([ByteRange::new(0, 10)])], ["https://example.com/about"])
            .with_page("https://example.com/about", [sheet([ByteRange::new(5, 15)])], Vec::<String>::new());

        let events = run(&mock, SEED, &options(1, 5, temp_dir.path())).await;

        let result = complete(&events);
        assert_eq!(result.pages_scanned, 2);
        assert_eq!(result.total_bytes, 26);
        assert_eq!(result.used_bytes, 15);
    }

    #[tokio::test]
    async fn test_never_visits_other_origins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_page(SEED, [], ["https://b.com/x", "https://example.com/ok"]);

        let events = run(&mock, SEED, &options(2, 10, temp_dir.path())).await;

        assert_eq!(complete(&events).pages_scanned, 2);
        assert_eq!(mock.visited(), [SEED, "https://example.com/ok"]);
    }

    #[tokio::test]
    async fn test_page_budget_caps_deep_crawl() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_page(SEED, [], ["https://example.com/a", "https://example.com/b"]);

        let events = run(&mock, SEED, &options(2, 1, temp_dir.path())).await;

        assert_eq!(complete(&events).pages_scanned, 1);
        assert_eq!(mock.visited(), [SEED]);
    }

    #[tokio::test]
    async fn test_depth_zero_skips_link_extraction() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_page(SEED, [], ["https://example.com/a"]);

        let events = run(&mock, SEED, &options(0, 10, temp_dir.path())).await;

        assert_eq!(complete(&events).pages_scanned, 1);
        assert!(!mock.calls().contains(&Call::ExtractLinks));
    }

    #[tokio::test]
    async fn test_failed_navigation_still_counts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new()
            .with_page(SEED, [sheet([ByteRange::new(0, 12)])], ["https://example.com/down"])
            .with_failing_navigation("https://example.com/down");

        let events = run(&mock, SEED, &options(1, 5, temp_dir.path())).await;

        let result = complete(&events);
        assert_eq!(result.pages_scanned, 2);
        assert_eq!(result.scanned_urls, [SEED, "https://example.com/down"]);
        assert_eq!(result.used_bytes, 12);
    }

    #[tokio::test]
    async fn test_fatal_error_closes_browser_without_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_failing_coverage(SEED);

        let events = run(&mock, SEED, &options(0, 1, temp_dir.path())).await;

        assert_eq!(events.len(), 3);
        let err = events.last().unwrap().as_ref().unwrap_err();
        assert!(matches!(&**err, ErrorKind::Collect(url) if url == SEED));
        assert!(mock.is_closed());
        assert!(!temp_dir.path().join("used.css").exists());
    }

    #[tokio::test]
    async fn test_launch_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new().with_failing_launch();

        let events = run(&mock, SEED, &options(0, 1, temp_dir.path())).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(ScanEvent::Started { .. })));
        let err = events[1].as_ref().unwrap_err();
        assert!(matches!(&**err, ErrorKind::Browser));
        assert!(!mock.is_closed());
    }

    #[tokio::test]
    async fn test_invalid_seed_never_launches() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mock = MockRenderer::new();

        let events = run(&mock, "example.com", &options(0, 1, temp_dir.path())).await;

        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(matches!(&**err, ErrorKind::InvalidUrl(_)));
        assert!(mock.calls().is_empty());
    }
}
