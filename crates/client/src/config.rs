//! Client configuration read from the environment.

use std::time::Duration;

use pos_core::CashierId;
use reqwest::Url;
use thiserror::Error;

pub const API_URL_VAR: &str = "POS_API_URL";
pub const CASHIER_ID_VAR: &str = "POS_CASHIER_ID";
pub const REQUEST_TIMEOUT_VAR: &str = "POS_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{var} must be a whole number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Where the product and sale services live, and how to call them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Cashier recorded on every sale. Identity resolution is out of scope.
    pub cashier_id: CashierId,
    /// `None` leaves timeouts to the transport defaults.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cashier_id: CashierId::DEFAULT,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Read `POS_API_URL`, `POS_CASHIER_ID` and `POS_REQUEST_TIMEOUT_SECS`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(API_URL_VAR) {
            config.api_url = raw.trim().to_string();
            config.base_url()?;
        }

        if let Some(raw) = lookup(CASHIER_ID_VAR) {
            config.cashier_id = raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: CASHIER_ID_VAR,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: REQUEST_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// The parsed service root that endpoint paths are appended to.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidUrl {
            var: API_URL_VAR,
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                var: API_URL_VAR,
                reason: "URL cannot carry a path".to_string(),
            });
        }
        Ok(url)
    }

    /// Build the HTTP client shared by the product and sale clients.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}
