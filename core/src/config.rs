//! Client configuration.
//!
//! Built once and shared read-only by every call. Credentials are held as
//! [`SecretString`] so they never show up in `Debug` output or logs.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://app.billbee.io/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct ApiConfig {
    base_url: String,
    api_key: SecretString,
    username: String,
    password: SecretString,
    timeout: Duration,
}

impl ApiConfig {
    /// Fails when `base_url` is not an absolute http(s) URL.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("base url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ApiError::Config(
                "base url must not carry a query or fragment".to_string(),
            ));
        }
        let api_key: String = api_key.into();
        let password: String = password.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
            username: username.into(),
            password: SecretString::from(password),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `BILLBEE_BASE_URL` (optional), `BILLBEE_API_KEY`,
    /// `BILLBEE_USERNAME`, `BILLBEE_PASSWORD` and `BILLBEE_TIMEOUT_SECS`
    /// (optional).
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Config(format!("{name} is not set")))
        };
        let base_url = lookup("BILLBEE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = Self::new(
            &base_url,
            required("BILLBEE_API_KEY")?,
            required("BILLBEE_USERNAME")?,
            required("BILLBEE_PASSWORD")?,
        )?;
        match lookup("BILLBEE_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| ApiError::Config(format!("BILLBEE_TIMEOUT_SECS: {secs:?} is not a number")))?;
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
            None => Ok(config),
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}
