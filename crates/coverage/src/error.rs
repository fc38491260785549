//! Coverage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A coverage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for coverage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The CSS could not be pretty-printed. Recovered by the fallback
    /// formatter; never surfaces from [`emit`](crate::emit).
    #[display("CSS could not be formatted")]
    Format,
    /// An output artifact could not be written.
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Format.to_string(), "CSS could not be formatted");
        assert_eq!(ErrorKind::Write(PathBuf::from("out/used.css")).to_string(), "could not write out/used.css");
    }
}
