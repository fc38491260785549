//! Layered configuration for css-scan.
//!
//! Sources are merged in increasing priority:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform config directory,
//! 3. an explicit config file (TOML, YAML or JSON, chosen by extension),
//! 4. `CSSCAN_*` environment variables,
//! 5. command-line overrides.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "CSSCAN_";
const USER_CONFIG_FILENAME: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link distance from the seed to follow. 0 scans the seed only.
    pub depth: u32,
    /// Maximum number of pages to visit, at least 1.
    pub max_pages: usize,
    /// Directory receiving `used.css` and `unused.css`.
    pub output_dir: PathBuf,
    /// Chrome/Chromium executable; discovered on the system when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<PathBuf>,
    /// Keep Chrome's process sandbox enabled.
    pub sandbox: bool,
    pub navigation_timeout_secs: u64,
    pub settle_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 0,
            max_pages: 1,
            output_dir: PathBuf::from("."),
            chrome: None,
            sandbox: false,
            navigation_timeout_secs: 30,
            settle_millis: 200,
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from every source, including the per-user config
    /// file if one exists.
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        Self::layered(user_config_path().as_deref(), explicit, overrides)
    }

    /// Like [`load`](Self::load), with the per-user config file given
    /// explicitly (`None` skips it).
    pub fn layered(user: Option<&Path>, explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = user {
            tracing::debug!(path = %user.display(), "Merging user config file (if present)");
            figment = figment.merge(Toml::file(user));
        }
        if let Some(explicit) = explicit {
            if !explicit.is_file() {
                exn::bail!(ErrorKind::NotFound(explicit.to_path_buf()));
            }
            tracing::debug!(path = %explicit.display(), "Merging config file");
            figment = match explicit.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(explicit)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(explicit)),
                Some("json") => figment.merge(Json::file(explicit)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(explicit.to_path_buf())),
            };
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
            .extract()
            .or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            exn::bail!(ErrorKind::Invalid("max_pages must be at least 1".to_string()));
        }
        if self.navigation_timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("navigation_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

/// `config.toml` inside the platform's per-user config directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "css-scan").map(|dirs| dirs.config_dir().join(USER_CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::layered(None, None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
            assert_eq!(config.settle(), Duration::from_millis(200));
            Ok(())
        });
    }

    #[rstest]
    #[case("scan.toml", "depth = 2\nmax_pages = 10\n")]
    #[case("scan.yaml", "depth: 2\nmax_pages: 10\n")]
    #[case("scan.yml", "depth: 2\nmax_pages: 10\n")]
    #[case("scan.json", r#"{"depth": 2, "max_pages": 10}"#)]
    fn test_explicit_file_formats(#[case] filename: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(filename, contents)?;
            let config = Config::layered(None, Some(Path::new(filename)), &ConfigOverrides::default()).unwrap();
            assert_eq!((config.depth, config.max_pages), (2, 10));
            assert_eq!(config.settle_millis, 200);
            Ok(())
        });
    }

    #[test]
    fn test_layer_priority() {
        Jail::expect_with(|jail| {
            jail.create_file("user.toml", "depth = 1\nmax_pages = 5\noutput_dir = \"user-out\"\nsettle_millis = 50\n")?;
            jail.create_file("scan.toml", "depth = 2\nmax_pages = 6\n")?;
            jail.set_env("CSSCAN_MAX_PAGES", "7");
            let overrides = ConfigOverrides {
                depth: Some(3),
                ..ConfigOverrides::default()
            };
            let config = Config::layered(Some(Path::new("user.toml")), Some(Path::new("scan.toml")), &overrides).unwrap();
            assert_eq!(config.depth, 3);
            assert_eq!(config.max_pages, 7);
            assert_eq!(config.output_dir, PathBuf::from("user-out"));
            assert_eq!(config.settle_millis, 50);
            Ok(())
        });
    }

    #[test]
    fn test_missing_user_file_is_ignored() {
        Jail::expect_with(|_jail| {
            let config = Config::layered(Some(Path::new("absent.toml")), None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = Config::layered(None, Some(Path::new("absent.toml")), &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(path) if path == Path::new("absent.toml")));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_format() {
        Jail::expect_with(|jail| {
            jail.create_file("scan.ini", "depth=2")?;
            let err = Config::layered(None, Some(Path::new("scan.ini")), &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
            Ok(())
        });
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        Jail::expect_with(|jail| {
            jail.set_env("CSSCAN_DEPTH", "deep");
            let err = Config::layered(None, None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Parse));
            Ok(())
        });
    }

    #[rstest]
    #[case(ConfigOverrides { max_pages: Some(0), ..ConfigOverrides::default() })]
    fn test_rejects_zero_page_budget(#[case] overrides: ConfigOverrides) {
        Jail::expect_with(|_jail| {
            let err = Config::layered(None, None, &overrides).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_chrome_from_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("CSSCAN_CHROME", "/opt/chromium/chrome");
            let config = Config::layered(None, None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config.chrome, Some(PathBuf::from("/opt/chromium/chrome")));
            Ok(())
        });
    }
}
