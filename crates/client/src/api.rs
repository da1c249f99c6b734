//! Thin wrapper around `reqwest::Client` carrying base URL and credentials.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Shared HTTP client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let req = self.http.request(method, url);
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// GET `path` and decode a JSON body. Non-2xx statuses become [`ClientError::Status`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.request(Method::GET, path).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let api = ApiClient::new(ClientConfig::new("http://backend:8000/")).unwrap();
        assert_eq!(
            api.url("/api/materials/3/movements"),
            "http://backend:8000/api/materials/3/movements"
        );
    }
}
