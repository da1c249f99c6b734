use std::time::Duration;

use tracing::warn;

pub const DEFAULT_ALREADY_CORRECT_SENTINEL: &str = "Der Bestand ist bereits korrekt.";

/// Connection settings for the REST backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port, without trailing slash.
    pub base_url: String,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
    pub request_timeout: Duration,
    /// Text the backend puts into a 400 response when the counted value
    /// already equals recorded stock.
    pub already_correct_sentinel: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            request_timeout: Duration::from_secs(10),
            already_correct_sentinel: DEFAULT_ALREADY_CORRECT_SENTINEL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Defaults overridden by `STOCKTAKE_API_URL`, `STOCKTAKE_API_TOKEN` and
    /// `STOCKTAKE_HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("STOCKTAKE_API_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(token) = std::env::var("STOCKTAKE_API_TOKEN") {
            if !token.trim().is_empty() {
                config.token = Some(token);
            }
        }
        if let Ok(raw) = std::env::var("STOCKTAKE_HTTP_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.request_timeout = Duration::from_millis(ms),
                _ => warn!("ignoring invalid STOCKTAKE_HTTP_TIMEOUT_MS={:?}", raw),
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_already_correct_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.already_correct_sentinel = sentinel.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let config = ClientConfig::new("http://backend:8000/");
        assert_eq!(config.base_url, "http://backend:8000");
    }

    #[test]
    fn defaults_match_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.already_correct_sentinel, "Der Bestand ist bereits korrekt.");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.token.is_none());
    }
}
