//! Tautulli activity client

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::credentials::Credential;
use crate::error::FetchError;
use crate::fetcher::{check_credential, check_status_endpoint, current_epoch_ms, endpoint_url, StatusFetcher};
use crate::integration::Integration;
use crate::io::{redact_query, HttpClient};
use crate::session::{assign_ids, PollSnapshot, SessionFields};

const ACTIVITY_PATH: &str = "/api/v2";
const ACTIVITY_COMMAND: &str = "get_activity";

/// `{ "response": { "result": ..., "message": ..., "data": ... } }`
#[derive(Debug, Deserialize)]
struct ApiResponse {
    response: ApiEnvelope,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ActivityData {
    sessions: Vec<ActivitySession>,
}

#[derive(Debug, Deserialize)]
struct ActivitySession {
    title: String,
    user: String,
    #[serde(default)]
    progress_percent: Option<Percent>,
    #[serde(default)]
    thumb: Option<String>,
}

/// Tautulli reports progress as a number or as a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Percent {
    Number(f64),
    Text(String),
}

impl Percent {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Percent::Number(n) => Some(*n),
            Percent::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|p| p.is_finite())
    }
}

/// Decode a `get_activity` body into session fields, preserving order
fn decode_activity(body: &str) -> Result<Vec<SessionFields>, FetchError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::DecodeError(e.to_string()))?;

    if parsed.response.result.as_deref() == Some("error") {
        let message = parsed
            .response
            .message
            .unwrap_or_else(|| "unspecified error".to_string());
        return Err(FetchError::DecodeError(format!("Tautulli reported: {}", message)));
    }

    let data: ActivityData = serde_json::from_value(parsed.response.data)
        .map_err(|e| FetchError::DecodeError(e.to_string()))?;

    Ok(data
        .sessions
        .into_iter()
        .map(|s| SessionFields {
            title: s.title,
            user: s.user,
            progress_percent: s.progress_percent.as_ref().and_then(Percent::value),
            thumbnail_ref: s.thumb,
        })
        .collect())
}

/// Client for Tautulli's `get_activity` command
pub struct TautulliFetcher {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for TautulliFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TautulliFetcher").finish()
    }
}

impl TautulliFetcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StatusFetcher for TautulliFetcher {
    fn integration(&self) -> Integration {
        Integration::Tautulli
    }

    async fn fetch_status(&self, credential: &Credential) -> Result<PollSnapshot, FetchError> {
        check_credential(credential)?;
        let url = endpoint_url(
            &credential.endpoint_url,
            ACTIVITY_PATH,
            &[("cmd", ACTIVITY_COMMAND), ("apikey", credential.api_key.as_str())],
        )?;

        tracing::debug!("Fetching Tautulli activity from {}", redact_query(&url));
        let response = self.http.get(&url, &[]).await.map_err(|e| {
            tracing::debug!("Tautulli request failed: {}", e);
            FetchError::TransportError(e.to_string())
        })?;

        if response.status != 200 {
            tracing::debug!("Non-200 response from Tautulli: status={}", response.status);
            return Err(FetchError::ServerError(response.status));
        }

        let fields = decode_activity(&response.body).inspect_err(|e| {
            tracing::debug!("Failed to decode Tautulli activity: {}", e);
        })?;
        let sessions = assign_ids(fields);
        tracing::debug!("Tautulli reported {} session(s)", sessions.len());

        Ok(PollSnapshot {
            sessions,
            fetched_at_epoch_ms: current_epoch_ms(),
        })
    }

    async fn test_connection(&self, credential: &Credential) -> bool {
        check_status_endpoint(self.http.as_ref(), credential).await
    }
}
