//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    /// Standard input closed before a URL was entered.
    #[display("no URL given")]
    NoUrl,
    #[display("could not read from the terminal")]
    Terminal,
    #[display("chrome/chromium is not available")]
    Browser,
    #[display("scan failed")]
    Scan,
}
