use crate::error::{ErrorKind, Result};
use crate::format::{CssFormatter, format_or_fallback};
use crate::stats::Stats;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const USED_FILENAME: &str = "used.css";
pub const UNUSED_FILENAME: &str = "unused.css";

/// Paths of the two files written by [`emit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    pub used: PathBuf,
    pub unused: PathBuf,
}

/// Repairs CSS sliced at arbitrary offsets so that `{` and `}` counts match.
///
/// Missing closing braces are appended (one `}` per line); missing opening
/// braces are prepended. Braces inside strings and comments are counted too.
pub fn balance_braces(css: &str) -> String {
    let open = css.chars().fold(0_i64, |open, c| match c {
        '{' => open + 1,
        '}' => open - 1,
        _ => open,
    });
    // Infallible: the count is bounded by the input length.
    let missing = usize::try_from(open.unsigned_abs()).unwrap_or(0);
    match open {
        0 => css.to_string(),
        n if n > 0 => format!("{css}{}", "}\n".repeat(missing)),
        _ => format!("{}{css}", "{\n".repeat(missing)),
    }
}

/// Writes `used.css` and `unused.css` into `dir`, creating it if needed.
///
/// Each file starts with a one-line comment header naming the page count,
/// followed by the brace-balanced buffer, all passed through `formatter`. If
/// the formatter rejects the content the fallback formatter is used instead,
/// so a file is always written.
#[instrument(skip_all, fields(dir = %dir.as_ref().display(), pages = pages))]
pub fn emit(stats: &Stats, pages: usize, dir: impl AsRef<Path>, formatter: &dyn CssFormatter) -> Result<Artifacts> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).or_raise(|| ErrorKind::Write(dir.to_path_buf()))?;
    Ok(Artifacts {
        used: write_css(dir, USED_FILENAME, &stats.used_css, pages, formatter)?,
        unused: write_css(dir, UNUSED_FILENAME, &stats.unused_css, pages, formatter)?,
    })
}

fn write_css(dir: &Path, filename: &str, css: &str, pages: usize, formatter: &dyn CssFormatter) -> Result<PathBuf> {
    let path = dir.join(filename);
    let content = format!("/* {filename} - scanned {pages} pages */\n{}", balance_braces(css));
    let formatted = format_or_fallback(formatter, &content);
    std::fs::write(&path, &formatted).or_raise(|| ErrorKind::Write(path.clone()))?;
    tracing::info!(path = %path.display(), bytes = formatted.len(), "CSS artifact written");
    Ok(path)
}
