//! Runtime settings.
//!
//! [`GuideConfig`] is assembled once by the CLI (flags with environment
//! fallbacks) and handed to the components that need it. Nothing reads
//! settings from globals after startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::CacheSettings;
use crate::error::ConfigError;

/// Default guide page.
pub const DEFAULT_WIKI_URL: &str = "https://terraria.wiki.gg/wiki/Guide:Class_setups";

/// Default base for resolving relative item links.
pub const DEFAULT_WIKI_BASE: &str = "https://terraria.wiki.gg";

/// Default phase store location.
pub const DEFAULT_STATE_FILE: &str = "botconfig.json";

/// Default limit on the downloaded page size (8 MiB).
pub const DEFAULT_MAX_PAGE_SIZE: usize = 8 * 1024 * 1024;

/// Resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideConfig {
    /// Guide page to download.
    pub wiki_url: String,
    /// Base URL for relative item links.
    pub wiki_base: String,
    /// Freshness window of the parsed catalog.
    pub cache_ttl: Duration,
    /// Minimum gap between refresh attempts after a failure.
    pub retry_after: Duration,
    /// Bound on a single page download.
    pub timeout: Duration,
    /// Phase store file.
    pub state_file: PathBuf,
    /// Largest accepted page body in bytes.
    pub max_page_size: usize,
    /// Prometheus listener port; no exporter when `None`.
    pub metrics_port: Option<u16>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            wiki_url: DEFAULT_WIKI_URL.to_string(),
            wiki_base: DEFAULT_WIKI_BASE.to_string(),
            cache_ttl: Duration::from_secs(3600),
            retry_after: Duration::from_secs(60),
            timeout: Duration::from_secs(15),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            max_page_size: env_or("CLASSGUIDE_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE),
            metrics_port: None,
        }
    }
}

impl GuideConfig {
    /// Checks cross-field constraints clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [("wiki-url", &self.wiki_url), ("wiki-base", &self.wiki_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(field, url, "an http:// or https:// URL"));
            }
        }
        if self.cache_ttl.is_zero() {
            return Err(invalid("cache-ttl", "0s", "a positive duration"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout", "0s", "a positive duration"));
        }
        if self.max_page_size == 0 {
            return Err(invalid(
                "CLASSGUIDE_MAX_PAGE_SIZE",
                "0",
                "a positive byte count",
            ));
        }
        Ok(())
    }

    /// Cache timing derived from these settings.
    #[must_use]
    pub const fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: self.cache_ttl,
            retry_after: self.retry_after,
        }
    }
}

fn invalid(field: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

/// Reads an environment variable or falls back to `default` when the
/// variable is unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a human duration such as `90s`, `15m` or `1h 30m`.
///
/// # Errors
///
/// Returns a message suitable for clap's value parser error.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| format!("invalid duration '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GuideConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wiki_url, DEFAULT_WIKI_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.state_file, PathBuf::from("botconfig.json"));
    }

    #[test]
    fn rejects_non_http_url() {
        let config = GuideConfig {
            wiki_url: "ftp://example.org/page".to_string(),
            ..GuideConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wiki-url"), "got {err}");
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = GuideConfig {
            cache_ttl: Duration::ZERO,
            ..GuideConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retry_after_is_allowed() {
        let config = GuideConfig {
            retry_after: Duration::ZERO,
            ..GuideConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_duration_accepts_humantime() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn env_or_falls_back() {
        assert_eq!(env_or("CLASSGUIDE_TEST_UNSET_VARIABLE", 7usize), 7);
    }

    #[test]
    fn cache_settings_follow_config() {
        let config = GuideConfig {
            cache_ttl: Duration::from_secs(10),
            retry_after: Duration::from_secs(2),
            ..GuideConfig::default()
        };
        let settings = config.cache_settings();
        assert_eq!(settings.ttl, Duration::from_secs(10));
        assert_eq!(settings.retry_after, Duration::from_secs(2));
    }
}
