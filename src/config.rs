use crate::error::{Result, WayfarerError};

/// Default full-refund window, in days from subscription start.
const DEFAULT_MAX_REFUND_DAYS: u32 = 14;

/// Default collaborator request timeout, in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration for the membership core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the billing gateway (the `/subscription` API lives here).
    pub billing_base_url: String,
    /// Base URL of the auth service (profile + token refresh).
    pub auth_base_url: String,
    /// Full-refund window in days from subscription start.
    pub max_refund_days: u32,
    /// Timeout applied to every collaborator HTTP call.
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            billing_base_url: "https://api.example.com".to_string(),
            auth_base_url: "http://localhost:5001".to_string(),
            max_refund_days: DEFAULT_MAX_REFUND_DAYS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_billing_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.billing_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_max_refund_days(mut self, days: u32) -> Self {
        self.config.max_refund_days = days;
        self
    }

    #[must_use]
    pub fn with_http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// Load overrides from the environment.
    ///
    /// Recognized variables: `WAYFARER_BILLING_URL`, `WAYFARER_AUTH_URL`,
    /// `WAYFARER_MAX_REFUND_DAYS`, `WAYFARER_HTTP_TIMEOUT_SECS`. Unset
    /// variables leave the current values untouched; unparsable numeric
    /// values are ignored with a warning.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if let Ok(url) = std::env::var("WAYFARER_BILLING_URL") {
            self.config.billing_base_url = url;
        }
        if let Ok(url) = std::env::var("WAYFARER_AUTH_URL") {
            self.config.auth_base_url = url;
        }
        if let Ok(raw) = std::env::var("WAYFARER_MAX_REFUND_DAYS") {
            match raw.parse() {
                Ok(days) => self.config.max_refund_days = days,
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparsable WAYFARER_MAX_REFUND_DAYS"),
            }
        }
        if let Ok(raw) = std::env::var("WAYFARER_HTTP_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.config.http_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparsable WAYFARER_HTTP_TIMEOUT_SECS"),
            }
        }
        self
    }

    /// Finalize the configuration.
    pub fn build(self) -> Result<Config> {
        if self.config.billing_base_url.is_empty() {
            return Err(WayfarerError::bad_request("billing base URL must not be empty"));
        }
        if self.config.auth_base_url.is_empty() {
            return Err(WayfarerError::bad_request("auth base URL must not be empty"));
        }
        if self.config.http_timeout_secs == 0 {
            return Err(WayfarerError::bad_request("HTTP timeout must be at least 1 second"));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.max_refund_days, 14);
        assert_eq!(config.http_timeout_secs, 30);
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .with_billing_base_url("https://billing.test")
            .with_auth_base_url("https://auth.test")
            .with_max_refund_days(30)
            .with_http_timeout_secs(5)
            .build()
            .unwrap();

        assert_eq!(config.billing_base_url, "https://billing.test");
        assert_eq!(config.auth_base_url, "https://auth.test");
        assert_eq!(config.max_refund_days, 30);
        assert_eq!(config.http_timeout_secs, 5);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = Config::builder().with_http_timeout_secs(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_urls() {
        assert!(Config::builder().with_billing_base_url("").build().is_err());
        assert!(Config::builder().with_auth_base_url("").build().is_err());
    }
}
