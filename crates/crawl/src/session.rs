use crate::error::{ErrorKind, Result};
use crate::frontier::{CrawlTask, Frontier};
use crate::result::ScanResult;
use csscan_coverage::format::CssFormatter;
use csscan_coverage::{CoverageEntry, GlobalCoverage, Stats, emit};
use csscan_render::Viewport;
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

/// All mutable state of one scan: the frontier, the accumulated coverage and
/// the pages visited so far.
#[derive(Debug)]
pub struct ScanSession {
    frontier: Frontier,
    coverage: GlobalCoverage,
    scanned: Vec<String>,
}

impl ScanSession {
    pub fn new(seed: &str, max_depth: u32, max_pages: usize) -> Result<Self> {
        Ok(Self {
            frontier: Frontier::new(seed, max_depth, max_pages)?,
            coverage: GlobalCoverage::new(),
            scanned: Vec::new(),
        })
    }

    pub fn seed(&self) -> &str {
        self.frontier.seed().as_str()
    }

    /// Next page to visit. The page is recorded as scanned immediately, so it
    /// counts even if visiting it later yields nothing.
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        let task = self.frontier.next()?;
        self.scanned.push(task.url.to_string());
        tracing::info!(url = %task.url, depth = task.depth, count = self.scanned.len(), "Visiting page");
        Some(task)
    }

    pub fn pages_scanned(&self) -> usize {
        self.scanned.len()
    }

    /// Merges coverage from the page most recently returned by
    /// [`next_task`](Self::next_task).
    pub fn absorb(&mut self, entries: Vec<CoverageEntry>) {
        self.coverage.absorb(entries, self.frontier.visited_count());
    }

    pub fn wants_links(&self, depth: u32) -> bool {
        self.frontier.wants_links(depth)
    }

    pub fn discover(&mut self, links: Vec<String>, parent_depth: u32) {
        let found = links.len();
        let accepted = self.frontier.discover(links, parent_depth);
        tracing::debug!(found, accepted, "Links discovered");
    }

    pub fn coverage(&self) -> &GlobalCoverage {
        &self.coverage
    }

    /// Computes the final statistics and writes `used.css` and `unused.css`
    /// into `output_dir`.
    #[instrument(skip_all, fields(pages = self.scanned.len()))]
    pub fn finish(self, output_dir: &Path, formatter: &dyn CssFormatter) -> Result<ScanResult> {
        let stats = Stats::compute(&self.coverage);
        let pages = self.scanned.len();
        let artifacts = emit(&stats, pages, output_dir, formatter).or_raise(|| ErrorKind::Emit)?;
        Ok(ScanResult {
            seed: self.frontier.seed().to_string(),
            total_bytes: stats.total_bytes,
            used_bytes: stats.used_bytes,
            unused_bytes: stats.unused_bytes(),
            unused_percentage: stats.unused_percentage(),
            viewports: Viewport::labels(),
            artifacts,
            pages_scanned: pages,
            scanned_urls: self.scanned,
        })
    }
}
