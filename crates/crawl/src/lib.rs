//! The crawl-and-aggregate engine.
//!
//! [`scan`] owns a [`ScanSession`] for its whole lifetime: it pops pages from
//! the [`Frontier`], has the renderer collect their coverage, merges it into
//! the session's global coverage map and follows same-origin links until the
//! queue is empty or the page budget is spent. Progress is reported as a
//! stream of [`ScanEvent`]s.

pub mod error;
mod frontier;
mod result;
mod session;
mod stream;

pub use crate::frontier::{CrawlTask, Frontier};
pub use crate::result::ScanResult;
pub use crate::session::ScanSession;
pub use crate::stream::{ScanEvent, ScanOptions, scan};
