use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use hls::sniff::DEFAULT_SNIFF_BYTE_BUDGET;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Retry policy applied by the HTTP transport
#[derive(Debug, Clone, PartialEq)]
pub struct RetryParameters {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier applied to the delay after every retry
    pub backoff_factor: f64,
    /// Per-request timeout, zero disables it
    pub timeout: Duration,
}

impl Default for RetryParameters {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryParameters {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base_delay.mul_f64(self.backoff_factor.max(1.0).powi(exponent))
    }
}

/// Configurable options for manifest parsing
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Retry policy for network requests
    pub retry: RetryParameters,

    /// Caps the width of a live seek range, in seconds
    pub availability_window_override: Option<f64>,

    /// Drop all key tags; streams are then reported unencrypted
    pub ignore_drm_info: bool,

    /// Live presentation delay in seconds, 3 target durations when unset
    pub default_presentation_delay: Option<f64>,

    /// Bytes fetched from the first segment of a stream to find its start time
    pub sniff_byte_budget: u64,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            retry: RetryParameters::default(),
            availability_window_override: None,
            ignore_drm_info: false,
            default_presentation_delay: None,
            sniff_byte_budget: DEFAULT_SNIFF_BYTE_BUDGET,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: ManifestConfig::get_default_headers(),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
        }
    }
}

impl ManifestConfig {
    pub fn builder() -> crate::builder::ManifestConfigBuilder {
        crate::builder::ManifestConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays() {
        let retry = RetryParameters {
            base_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            ..Default::default()
        };
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(400));
    }
}
