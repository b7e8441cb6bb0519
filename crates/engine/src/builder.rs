//! Fluent construction of [`ManifestConfig`].
//!
//! ```
//! use std::time::Duration;
//! use manifest_engine::ManifestConfig;
//!
//! let config = ManifestConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_max_attempts(4)
//!     .with_user_agent("MyApp/1.0")
//!     .with_header("X-Api-Key", "my-secret-key")
//!     .with_availability_window_override(Some(120.0))
//!     .build();
//! assert_eq!(config.retry.max_attempts, 4);
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::ManifestConfig;

/// Starts from [`ManifestConfig::default`] and overrides one field per call
#[derive(Debug, Clone, Default)]
pub struct ManifestConfigBuilder {
    config: ManifestConfig,
}

impl ManifestConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts per request including the first, at least 1
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts.max(1);
        self
    }

    /// Per-request timeout; zero disables it
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.retry.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Cap the live seek window, in seconds
    pub fn with_availability_window_override(mut self, window: Option<f64>) -> Self {
        self.config.availability_window_override = window;
        self
    }

    pub fn with_ignore_drm_info(mut self, ignore: bool) -> Self {
        self.config.ignore_drm_info = ignore;
        self
    }

    /// Live presentation delay in seconds, replacing 3 target durations
    pub fn with_default_presentation_delay(mut self, delay: Option<f64>) -> Self {
        self.config.default_presentation_delay = delay;
        self
    }

    /// Bytes of the first segment fetched to read its start time
    pub fn with_sniff_byte_budget(mut self, budget: u64) -> Self {
        self.config.sniff_byte_budget = budget.max(1);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add one header; names or values that are not valid HTTP are skipped
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes());
        let value = HeaderValue::from_str(value.as_ref());
        if let (Ok(name), Ok(value)) = (name, value) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Replace every header sent with requests
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    pub fn build(self) -> ManifestConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryParameters;

    #[test]
    fn test_builder_defaults() {
        let config = ManifestConfigBuilder::new().build();
        assert_eq!(config.retry, RetryParameters::default());
        assert_eq!(config.sniff_byte_budget, 2048);
        assert_eq!(config.availability_window_override, None);
        assert!(!config.ignore_drm_info);
        assert!(config.follow_redirects);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ManifestConfigBuilder::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(20))
            .with_max_attempts(0)
            .with_user_agent("manifest-test/1.0")
            .with_header("X-Token", "abc")
            .with_ignore_drm_info(true)
            .with_default_presentation_delay(Some(10.0))
            .with_sniff_byte_budget(0)
            .build();

        assert_eq!(config.retry.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.user_agent, "manifest-test/1.0");
        assert!(config.ignore_drm_info);
        assert_eq!(config.default_presentation_delay, Some(10.0));
        assert_eq!(config.sniff_byte_budget, 1);
        assert_eq!(config.headers["x-token"], "abc");
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let config = ManifestConfigBuilder::new()
            .with_headers(HeaderMap::new())
            .with_header("Bad Header", "value")
            .build();
        assert!(config.headers.is_empty());
    }
}
