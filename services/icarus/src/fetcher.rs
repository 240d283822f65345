//! Fetcher trait and helpers shared by integration clients

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::credentials::{validate_url, Credential};
use crate::error::FetchError;
use crate::integration::Integration;
use crate::io::{redact_query, HttpClient};
use crate::session::PollSnapshot;

/// One request/decode round trip against an integration's status API
#[async_trait]
pub trait StatusFetcher: Send + Sync + std::fmt::Debug {
    /// The integration this fetcher talks to
    fn integration(&self) -> Integration;

    /// Fetch and decode the current activity
    async fn fetch_status(&self, credential: &Credential) -> Result<PollSnapshot, FetchError>;

    /// Lightweight reachability check used by the settings flow
    async fn test_connection(&self, credential: &Credential) -> bool;
}

/// Reject credentials that must not reach the network
pub fn check_credential(credential: &Credential) -> Result<(), FetchError> {
    if !credential.is_configured() {
        return Err(FetchError::NotConfigured);
    }
    if !validate_url(&credential.endpoint_url) {
        return Err(FetchError::InvalidUrl);
    }
    Ok(())
}

/// `{endpoint}{path}` with `query` appended and percent-encoded
pub fn endpoint_url(endpoint: &str, path: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
    let base = format!("{}{}", endpoint.trim_end_matches('/'), path);
    let url = if query.is_empty() {
        reqwest::Url::parse(&base)
    } else {
        reqwest::Url::parse_with_params(&base, query)
    };
    url.map(String::from).map_err(|_| FetchError::InvalidUrl)
}

/// `GET {endpoint}/status` with the API key in the `Authorization` header.
/// Reachable means HTTP 200; the body is ignored.
pub async fn check_status_endpoint(http: &dyn HttpClient, credential: &Credential) -> bool {
    if let Err(e) = check_credential(credential) {
        tracing::debug!("Skipping connection test: {}", e);
        return false;
    }
    let url = match endpoint_url(&credential.endpoint_url, "/status", &[]) {
        Ok(url) => url,
        Err(_) => return false,
    };

    match http
        .get(&url, &[("Authorization", credential.api_key.as_str())])
        .await
    {
        Ok(response) if response.status == 200 => {
            tracing::debug!("Connection test to {} succeeded", url);
            true
        }
        Ok(response) => {
            tracing::debug!(
                "Connection test to {} failed: status={}",
                url,
                response.status
            );
            false
        }
        Err(e) => {
            tracing::debug!("Connection test to {} failed: {}", redact_query(&url), e);
            false
        }
    }
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
