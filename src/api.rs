//! Client for the homework status API.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{HeraldError, Result};

/// Source of raw status payloads, keyed by the lower time bound.
pub trait StatusSource {
    /// Fetch every submission updated since `from_date` (epoch seconds).
    fn fetch(&self, from_date: i64) -> Result<Value>;
}

/// Blocking client for the Practicum homework status endpoint.
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    auth_header: String,
}

impl PracticumClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            auth_header: format!("OAuth {}", config.practicum_token),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl StatusSource for PracticumClient {
    fn fetch(&self, from_date: i64) -> Result<Value> {
        debug!(endpoint = %self.endpoint, from_date, "requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("from_date", from_date)])
            .send()
            .map_err(|source| {
                if source.is_timeout() {
                    error!(endpoint = %self.endpoint, "status API timed out: {source}");
                } else {
                    error!(endpoint = %self.endpoint, "status API connection error: {source}");
                }
                HeraldError::Network {
                    url: self.endpoint.clone(),
                    source: source.without_url(),
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "status API returned unexpected code"
            );
            return Err(HeraldError::Http {
                url: self.endpoint.clone(),
                status,
            });
        }

        let body = response.text().map_err(|source| {
            error!(endpoint = %self.endpoint, "failed to read status API body: {source}");
            HeraldError::Network {
                url: self.endpoint.clone(),
                source: source.without_url(),
            }
        })?;

        serde_json::from_str(&body).map_err(|source| {
            error!("status API body is not valid JSON: {source}");
            HeraldError::Parse { source }
        })
    }
}
