//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpConfig;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL with extra request headers
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Debug, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client that identifies itself with the configured user agent
    /// and gives up on a request after the configured timeout.
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| crate::IcarusError::Http(format!("Building HTTP client: {}", e)))?;

        tracing::debug!(
            "Created HTTP client (user_agent='{}', timeout={}s)",
            config.user_agent,
            config.timeout_seconds
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", redact_query(url));
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            crate::IcarusError::Http(format!(
                "GET {} failed: {}",
                redact_query(url),
                e.without_url()
            ))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::IcarusError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!(
            "GET {} -> {} ({} bytes)",
            redact_query(url),
            status,
            body.len()
        );
        Ok(HttpResponse { status, body })
    }
}

/// Strip the query string so API keys carried as parameters never reach the logs.
pub(crate) fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
