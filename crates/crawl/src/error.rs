//! Crawl Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A crawl error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The seed is not an absolute `http://` or `https://` URL.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The browser could not be launched or shut down.
    #[display("browser session failed")]
    Browser,
    /// Visiting a page failed for a reason other than navigation.
    #[display("failed to collect coverage for {_0}")]
    Collect(#[error(not(source))] String),
    /// The output artifacts could not be written.
    #[display("failed to write CSS artifacts")]
    Emit,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
