use std::time::Duration;

use logibooks_core::Locale;
use reqwest::Url;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API. Bearer tokens are only sent to URLs under it.
    pub api_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Interval between progress polls of a running job.
    pub poll_interval: Duration,
    /// Language of status labels and transport messages.
    pub locale: Locale,
    /// Bearer token to open a session with, if any.
    pub token: Option<String>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the API URL.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            locale: Locale::default(),
            token: None,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                     |
    /// |----------------------------------|-----------------------------|
    /// | `LOGIBOOKS_API_URL`              | `http://localhost:8080/api` |
    /// | `LOGIBOOKS_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `LOGIBOOKS_POLL_INTERVAL_MS`     | `1000`                      |
    /// | `LOGIBOOKS_LOCALE`               | `ru`                        |
    /// | `LOGIBOOKS_TOKEN`                | unset                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("LOGIBOOKS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let api_url = Url::parse(raw_url.trim()).map_err(|_| ConfigError::Invalid {
            var: "LOGIBOOKS_API_URL",
            expected: "an absolute URL",
            value: raw_url.clone(),
        })?;

        let request_timeout_secs = parse_u64(
            &lookup,
            "LOGIBOOKS_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let poll_interval_ms =
            parse_u64(&lookup, "LOGIBOOKS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "LOGIBOOKS_POLL_INTERVAL_MS",
                expected: "a positive integer",
                value: "0".into(),
            });
        }

        let locale = match lookup("LOGIBOOKS_LOCALE") {
            Some(tag) => tag.parse::<Locale>()?,
            None => Locale::default(),
        };

        let token = lookup("LOGIBOOKS_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            poll_interval: Duration::from_millis(poll_interval_ms),
            locale,
            token,
        })
    }

    /// API base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "a non-negative integer",
            value: raw,
        }),
    }
}
