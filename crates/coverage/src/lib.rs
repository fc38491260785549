//! Stylesheet coverage accounting.
//!
//! Everything in this crate is independent of the browser that produced the
//! coverage data:
//!
//! - [`merge`] reduces a set of [`ByteRange`]s to a minimal, sorted,
//!   non-overlapping set.
//! - [`GlobalCoverage`] accumulates [`CoverageEntry`]s from many page visits,
//!   keyed by stylesheet identity.
//! - [`Stats`] walks the accumulated ranges to produce byte counts and the
//!   used/unused CSS buffers.
//! - [`emit`] writes `used.css` and `unused.css`, formatted through a
//!   [`CssFormatter`](format::CssFormatter) with a regex fallback.

mod aggregate;
mod emit;
pub mod error;
pub mod format;
mod range;
mod stats;

pub use crate::aggregate::{CoverageRecord, GlobalCoverage};
pub use crate::emit::{Artifacts, UNUSED_FILENAME, USED_FILENAME, balance_braces, emit};
pub use crate::range::{ByteRange, merge};
pub use crate::stats::Stats;

/// Raw coverage for one stylesheet, as observed during a single page visit.
///
/// `url` is empty for inline or anonymous stylesheets. `ranges` are byte
/// offsets into `text` and may be unsorted or overlapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageEntry {
    pub url: String,
    pub text: String,
    pub ranges: Vec<ByteRange>,
}
impl CoverageEntry {
    pub fn new(url: impl Into<String>, text: impl Into<String>, ranges: impl IntoIterator<Item = ByteRange>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            ranges: ranges.into_iter().collect(),
        }
    }
}
