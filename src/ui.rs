use csscan_crawl::ScanResult;
use std::io::{self, BufRead, Write};

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
pub const URL_PROMPT: &str = "Enter a website URL to scan: ";
pub const URL_SCHEME_ERROR: &str = "URL must start with http:// or https://";

/// Human-readable size in powers of 1024 with at most two decimals, such as
/// `"1.5 KB"` or `"0 Bytes"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", UNITS[0]);
    }
    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

pub fn validate_url(input: &str) -> Result<&str, &'static str> {
    let url = input.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(URL_SCHEME_ERROR)
    }
}

/// Asks for a URL until a valid one is entered. Returns `None` on end of
/// input.
pub fn prompt_url(mut input: impl BufRead, mut output: impl Write) -> io::Result<Option<String>> {
    let mut line = String::new();
    loop {
        write!(output, "{URL_PROMPT}")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match validate_url(&line) {
            Ok(url) => return Ok(Some(url.to_string())),
            Err(message) => writeln!(output, "{message}")?,
        }
    }
}

pub fn progress_line(url: &str, count: usize, max_pages: usize) -> String {
    format!("[{count}/{max_pages}] Scanning {url}")
}

pub fn summary(result: &ScanResult, depth: u32, max_pages: usize) -> String {
    let rows: [(&str, String); 10] = [
        ("Base URL:", result.seed.clone()),
        ("Pages Scanned:", result.pages_scanned.to_string()),
        ("Depth:", format!("{depth} | Max: {max_pages}")),
        ("Viewports:", result.viewports.join(", ")),
        ("Used CSS:", format_bytes(result.used_bytes)),
        ("Unused CSS:", format_bytes(result.unused_bytes)),
        ("Total CSS:", format_bytes(result.total_bytes)),
        ("Percentage Unused:", format!("{}%", result.unused_percentage)),
        ("Exported Used CSS:", result.artifacts.used.display().to_string()),
        ("Exported Unused CSS:", result.artifacts.unused.display().to_string()),
    ];
    rows.iter().fold(String::from("Scan Complete\n"), |out, (label, value)| {
        out + &format!("  {label:<22}{value}\n")
    })
}

pub fn failure(message: &str) -> String {
    format!("Scan Failed\n  {message}")
}
