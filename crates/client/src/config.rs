// crates/client/src/config.rs
//! Connection settings for `HttpJobsApi`.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// `BULKADD_BASE_URL` overrides the default server root.
    pub fn from_env() -> Self {
        match std::env::var("BULKADD_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.request_timeout = timeout;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://jam.local:9000/ ");
        assert_eq!(config.base_url, "http://jam.local:9000");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_from_env_base_url() {
        std::env::remove_var("BULKADD_BASE_URL");
        assert_eq!(ClientConfig::from_env(), ClientConfig::default());

        std::env::set_var("BULKADD_BASE_URL", "http://jam.local:9000/");
        assert_eq!(ClientConfig::from_env().base_url, "http://jam.local:9000");

        std::env::set_var("BULKADD_BASE_URL", "   ");
        assert_eq!(ClientConfig::from_env().base_url, DEFAULT_BASE_URL);

        std::env::remove_var("BULKADD_BASE_URL");
    }

    #[test]
    fn test_zero_timeout_keeps_default() {
        let config = ClientConfig::default().with_request_timeout(Duration::ZERO);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
