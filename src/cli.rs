use clap::{ArgAction, Parser};
use csscan_config::ConfigOverrides;
use std::path::PathBuf;

/// Measure how much of a website's CSS is actually used.
///
/// Renders each page at desktop, tablet and mobile sizes, then writes the CSS
/// that was applied to `used.css` and everything else to `unused.css`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Website URL to scan; prompted for when omitted
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// How many links away from the URL to follow [default: 0]
    #[arg(short, long, value_name = "N")]
    pub depth: Option<u32>,

    /// Maximum number of pages to scan [default: 1]
    #[arg(short, long, value_name = "N")]
    pub max_pages: Option<usize>,

    /// Directory to write used.css and unused.css into [default: .]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Chrome/Chromium executable to use instead of searching for one
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            depth: self.depth,
            max_pages: self.max_pages,
            output_dir: self.output.clone(),
            chrome: self.chrome.clone(),
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from(["css-scan", "-u", "https://example.com", "-d", "2", "-m", "10", "-o", "out"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("https://example.com"));
        assert_eq!(
            args.overrides(),
            ConfigOverrides {
                depth: Some(2),
                max_pages: Some(10),
                output_dir: Some(PathBuf::from("out")),
                chrome: None,
            }
        );
    }

    #[test]
    fn test_omitted_flags_do_not_override() {
        let args = Args::try_parse_from(["css-scan"]).unwrap();
        assert_eq!(args.url, None);
        assert_eq!(args.overrides(), ConfigOverrides::default());
    }

    #[rstest]
    #[case(&[], "warn")]
    #[case(&["-v"], "info")]
    #[case(&["-vv"], "debug")]
    #[case(&["-vvv"], "trace")]
    #[case(&["-v", "-v", "-v", "-v"], "trace")]
    fn test_log_level(#[case] flags: &[&str], #[case] expected: &str) {
        let args = Args::try_parse_from(std::iter::once("css-scan").chain(flags.iter().copied())).unwrap();
        assert_eq!(args.log_level(), expected);
    }

    #[test]
    fn test_rejects_negative_depth() {
        assert!(Args::try_parse_from(["css-scan", "--depth", "-1"]).is_err());
    }
}
