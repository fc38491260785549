//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    /// The browser process could not be started or connected to.
    #[display("failed to launch browser: {_0}")]
    Launch(#[error(not(source))] String),
    /// A page failed to load, or did not settle before the timeout. Recovered
    /// during coverage collection; the page still counts as visited.
    #[display("navigation to {_0} failed")]
    Navigation(#[error(not(source))] String),
    /// A DevTools protocol command was rejected or the connection dropped.
    #[display("browser protocol error")]
    Protocol,
    /// A script evaluated in the page failed or returned an unexpected shape.
    #[display("script evaluation failed")]
    Evaluate,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
