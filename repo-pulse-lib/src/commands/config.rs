use crate::Result;
use crate::facts::{HostingOptions, RetryPolicy};
use crate::serve::ServeOptions;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "repo-pulse.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS policy
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Interval between pushes to WebSocket clients
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Per-request timeout for GitHub API calls
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_max_star_events")]
    pub max_star_events: usize,

    #[serde(default = "default_max_star_pages")]
    pub max_star_pages: u32,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: u32,

    /// Fixed seed for the analytics generator; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_star_events() -> usize {
    2000
}

const fn default_max_star_pages() -> u32 {
    20
}

const fn default_max_concurrent_requests() -> usize {
    5
}

const fn default_trending_window_days() -> u32 {
    365
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `repo-pulse.toml` in `base_dir` is used when it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repo-pulse configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-pulse configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(app_err!("bind must not be empty"));
        }

        if self.port == 0 {
            return Err(app_err!("port must be greater than 0"));
        }

        let _ = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;

        for origin in &self.allowed_origins {
            let _ = Url::parse(origin).into_app_err_with(|| format!("allowed origin '{origin}' is not a valid URL"))?;
        }

        if self.refresh_interval.is_zero() {
            return Err(app_err!("refresh_interval must be greater than 0"));
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than 0"));
        }

        if self.max_star_pages == 0 {
            return Err(app_err!("max_star_pages must be greater than 0"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be greater than 0"));
        }

        if self.trending_window_days == 0 {
            return Err(app_err!("trending_window_days must be greater than 0"));
        }

        Ok(())
    }

    #[must_use]
    pub fn hosting_options(&self) -> HostingOptions {
        HostingOptions {
            api_base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout,
            retry: RetryPolicy::default(),
            max_concurrent_requests: self.max_concurrent_requests,
            max_star_events: self.max_star_events,
            max_star_pages: self.max_star_pages,
            trending_window_days: self.trending_window_days,
        }
    }

    #[must_use]
    pub fn serve_options(&self) -> ServeOptions {
        ServeOptions {
            bind: self.bind.clone(),
            port: self.port,
            allowed_origins: self.allowed_origins.clone(),
            refresh_interval: self.refresh_interval,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            api_base_url: default_api_base_url(),
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            max_star_events: default_max_star_events(),
            max_star_pages: default_max_star_pages(),
            max_concurrent_requests: default_max_concurrent_requests(),
            trending_window_days: default_trending_window_days(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_default_config_matches_embedded() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let parsed: Config = toml::from_str("port = 9000\nrefresh_interval = \"2m\"\nseed = 7\n").unwrap();

        assert_eq!(parsed.port, 9000);
        assert_eq!(parsed.refresh_interval, Duration::from_secs(120));
        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.bind, "127.0.0.1");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let _ = toml::from_str::<Config>("colour = \"blue\"\n").unwrap_err();
    }

    #[test]
    fn test_validate_zero_port() {
        let config = Config { port: 0, ..Config::default() };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_zero_refresh_interval() {
        let config = Config {
            refresh_interval: Duration::ZERO,
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_bad_api_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = Config {
            allowed_origins: vec!["not an origin".to_string()],
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config {
            max_concurrent_requests: 0,
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let (_tmp, dir) = tmp_dir();
        let output_path = dir.join("custom.toml");

        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(&dir, Some(&output_path)).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let (_tmp, dir) = tmp_dir();
        assert_eq!(Config::load(&dir, None).unwrap(), Config::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_picks_up_file_in_base_dir() {
        let (_tmp, dir) = tmp_dir();
        fs::write(dir.join(DEFAULT_CONFIG_FILE), "port = 8123\n").unwrap();

        assert_eq!(Config::load(&dir, None).unwrap().port, 8123);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_explicit_missing_file_fails() {
        let (_tmp, dir) = tmp_dir();
        let _ = Config::load(&dir, Some(&dir.join("nope.toml"))).unwrap_err();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_rejects_invalid_values() {
        let (_tmp, dir) = tmp_dir();
        let path = dir.join("bad.toml");
        fs::write(&path, "max_star_pages = 0\n").unwrap();

        let _ = Config::load(&dir, Some(&path)).unwrap_err();
    }

    #[test]
    fn test_hosting_options_carry_settings() {
        let config = Config {
            max_star_events: 10,
            trending_window_days: 7,
            ..Config::default()
        };
        let options = config.hosting_options();

        assert_eq!(options.max_star_events, 10);
        assert_eq!(options.trending_window_days, 7);
        assert_eq!(options.api_base_url, "https://api.github.com");
    }
}
