use csscan_coverage::Artifacts;

/// Final, read-only summary of a completed scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    /// The normalized seed URL.
    pub seed: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub unused_bytes: u64,
    /// Two-decimal percentage (`"53.85"`), or `"0"` when no CSS was found.
    pub unused_percentage: String,
    /// Labels of the viewports every page was rendered at.
    pub viewports: Vec<String>,
    pub artifacts: Artifacts,
    pub pages_scanned: usize,
    /// Visited URLs, in visit order.
    pub scanned_urls: Vec<String>,
}
