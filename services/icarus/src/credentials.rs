//! Per-integration endpoint URL and API key storage

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::integration::Integration;
use crate::settings::SettingsRepository;

/// scheme, then localhost / dotted IPv4 / dotted hostname, optional port, optional path
static URL_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)(localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,})(:\d+)?(/.*)?$",
    )
    .expect("URL grammar is a valid regex")
});

/// Endpoint and API key for one integration. Empty fields mean unconfigured.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub endpoint_url: String,
    pub api_key: String,
}

impl Credential {
    pub fn new(endpoint_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Both fields are present, so a fetch may be attempted
    pub fn is_configured(&self) -> bool {
        !self.endpoint_url.is_empty() && !self.api_key.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Credential")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &api_key)
            .finish()
    }
}

/// Test `candidate` against the endpoint URL grammar. Pure, no I/O.
pub fn validate_url(candidate: &str) -> bool {
    URL_GRAMMAR.is_match(candidate)
}

pub fn api_key_key(integration: Integration) -> String {
    format!("apiKey_{}", integration.name())
}

pub fn api_url_key(integration: Integration) -> String {
    format!("apiURL_{}", integration.name())
}

/// Credentials for every integration, kept in the shared settings repository
#[derive(Debug, Clone)]
pub struct CredentialStore {
    repo: Arc<dyn SettingsRepository>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Overwrite the stored credential. No validation happens here.
    pub fn save(&self, integration: Integration, endpoint_url: &str, api_key: &str) -> crate::Result<()> {
        self.repo
            .set(&api_key_key(integration), Value::from(api_key))?;
        self.repo
            .set(&api_url_key(integration), Value::from(endpoint_url))?;
        tracing::info!("{} API settings saved: {}", integration, endpoint_url);
        Ok(())
    }

    /// Stored credential, or empty strings when nothing has been saved
    pub fn load(&self, integration: Integration) -> Credential {
        Credential {
            endpoint_url: self
                .repo
                .get_string(&api_url_key(integration))
                .unwrap_or_default(),
            api_key: self
                .repo
                .get_string(&api_key_key(integration))
                .unwrap_or_default(),
        }
    }
}
