use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};

const ENV_VARS: [&str; 2] = ["CHROME", "CHROME_BIN"];
// TODO: What are the executable names on Windows? macOS?
const EXECUTABLES: [&str; 5] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];

/// Locates a Chrome/Chromium binary.
///
/// An explicitly configured path wins, then the `CHROME` and `CHROME_BIN`
/// environment variables, then well-known executable names on `PATH`.
pub(crate) fn discover(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured Chrome executable does not exist; searching the system");
    }
    for var in ENV_VARS {
        if let Some(path) = std::env::var_os(var).map(PathBuf::from)
            && path.is_file()
        {
            tracing::debug!(var, path = %path.display(), "Chrome executable taken from environment");
            return Ok(path);
        }
    }
    for exe in EXECUTABLES {
        if let Ok(path) = which::which(exe) {
            tracing::debug!(path = %path.display(), "Discovered Chrome executable in PATH");
            return Ok(path);
        }
    }
    tracing::info!("Chrome executable not found in PATH");
    exn::bail!(ErrorKind::ChromeNotFound);
}
