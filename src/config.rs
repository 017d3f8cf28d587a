//! Runtime configuration.
//!
//! Secrets come from the environment and are checked once at startup. The
//! resulting [`Config`] is passed by reference to the status client and the
//! messenger; nothing reads the environment after that.

use std::env;
use std::time::Duration;

use crate::error::{HeraldError, Result};

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const PRACTICUM_ENDPOINT: &str = "PRACTICUM_ENDPOINT";
pub const TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";

/// Required variables, in the order they are checked.
pub const REQUIRED_VARS: [&str; 3] = [PRACTICUM_TOKEN, TELEGRAM_TOKEN, TELEGRAM_CHAT_ID];

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_RETRY_SECS: u64 = 600;

#[derive(Clone)]
pub struct Config {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub endpoint: String,
    pub telegram_api_url: String,
    pub retry_interval: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("endpoint", &self.endpoint)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("retry_interval", &self.retry_interval)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Blank values are treated the same as unset ones. The first missing
    /// required variable, in [`REQUIRED_VARS`] order, is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            non_blank(lookup(name)).ok_or(HeraldError::Config { name })
        };

        let practicum_token = required(PRACTICUM_TOKEN)?;
        let telegram_token = required(TELEGRAM_TOKEN)?;
        let telegram_chat_id = required(TELEGRAM_CHAT_ID)?;

        let endpoint =
            non_blank(lookup(PRACTICUM_ENDPOINT)).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let telegram_api_url = non_blank(lookup(TELEGRAM_API_URL))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        Ok(Config {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            endpoint,
            telegram_api_url,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_SECS),
        })
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }
}

/// Names of required variables that are missing or blank, in check order.
pub fn check_tokens<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_VARS
        .into_iter()
        .filter(|&name| non_blank(lookup(name)).is_none())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
