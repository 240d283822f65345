//! Icarus - media-server status poller
//!
//! Stores per-integration credentials, polls each integration's activity
//! API on a user-selected interval and publishes the latest status.

pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod integration;
pub mod io;
pub mod lifecycle;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod tautulli;

pub use config::{load_config, Config};
pub use error::{FetchError, IcarusError, Result};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialStore;
use crate::dashboard::{describe_status, Dashboard};
use crate::fetcher::{check_status_endpoint, StatusFetcher};
use crate::integration::Integration;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::lifecycle::LifecycleEvent;
use crate::scheduler::PollScheduler;
use crate::settings::{JsonFileSettings, Preferences, SettingsRepository};
use crate::tautulli::TautulliFetcher;

/// The fetcher for `integration`, if one exists
pub fn fetcher_for(
    integration: Integration,
    http: Arc<dyn HttpClient>,
) -> Option<Arc<dyn StatusFetcher>> {
    match integration {
        Integration::Tautulli => Some(Arc::new(TautulliFetcher::new(http))),
        _ => None,
    }
}

/// Check the stored credential of `integration` against its `/status`
/// endpoint. Works for every integration, polled or not.
pub async fn test_connection(
    integration: Integration,
    credentials: &CredentialStore,
    http: &dyn HttpClient,
) -> bool {
    let credential = credentials.load(integration);
    let reachable = check_status_endpoint(http, &credential).await;
    tracing::debug!("Connection test for {}: reachable={}", integration, reachable);
    reachable
}

/// Assembles a [`Dashboard`] from configuration and persisted preferences.
///
/// The settings repository, HTTP client and fetchers can be injected;
/// anything not injected is built from the config.
pub struct DashboardBuilder {
    config: Config,
    settings: Option<Arc<dyn SettingsRepository>>,
    http_client: Option<Arc<dyn HttpClient>>,
    fetchers: Option<Vec<Arc<dyn StatusFetcher>>>,
}

impl DashboardBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            settings: None,
            http_client: None,
            fetchers: None,
        }
    }

    pub fn with_settings(mut self, settings: Arc<dyn SettingsRepository>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http);
        self
    }

    /// Replace the config-derived fetchers
    pub fn with_fetchers(mut self, fetchers: Vec<Arc<dyn StatusFetcher>>) -> Self {
        self.fetchers = Some(fetchers);
        self
    }

    pub fn build(self) -> Result<Dashboard> {
        let settings: Arc<dyn SettingsRepository> = match self.settings {
            Some(settings) => settings,
            None => Arc::new(JsonFileSettings::open(&self.config.settings_path)?),
        };
        let preferences = Preferences::load(settings.as_ref());
        let credentials = CredentialStore::new(Arc::clone(&settings));

        let fetchers = match self.fetchers {
            Some(fetchers) => fetchers,
            None => {
                let http: Arc<dyn HttpClient> = match self.http_client {
                    Some(http) => http,
                    None => Arc::new(ReqwestHttpClient::new(&self.config.http)?),
                };
                let mut fetchers: Vec<Arc<dyn StatusFetcher>> = Vec::new();
                for integration in &self.config.integrations {
                    if fetchers.iter().any(|f| f.integration() == *integration) {
                        tracing::warn!("Integration '{}' listed twice, ignoring", integration);
                        continue;
                    }
                    match fetcher_for(*integration, Arc::clone(&http)) {
                        Some(fetcher) => fetchers.push(fetcher),
                        None => tracing::warn!(
                            "No status client for integration '{}', skipping",
                            integration
                        ),
                    }
                }
                fetchers
            }
        };

        let schedulers = fetchers
            .into_iter()
            .map(|fetcher| {
                Arc::new(PollScheduler::new(
                    fetcher.integration(),
                    credentials.clone(),
                    fetcher,
                ))
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Dashboard built with {} scheduler(s), interval {}",
            schedulers.len(),
            preferences.refresh_interval
        );

        Ok(Dashboard::new(
            schedulers,
            credentials,
            preferences.refresh_interval,
        ))
    }
}

/// Start polling every integration and log each status change until
/// `cancel` fires, then stop all schedulers.
pub async fn run(dashboard: Arc<Dashboard>, cancel: CancellationToken) -> Result<()> {
    let mut watchers = Vec::new();
    for integration in dashboard.integrations() {
        let Some(mut rx) = dashboard.subscribe(integration) else {
            continue;
        };
        let dashboard = Arc::clone(&dashboard);
        let cancel = cancel.clone();
        watchers.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                let status = rx.borrow_and_update().clone();
                let endpoint = dashboard.credential(integration).endpoint_url;
                for line in describe_status(integration, &status, &endpoint) {
                    tracing::info!("{}", line);
                }
            }
        }));
    }

    dashboard.handle(LifecycleEvent::Appeared)?;
    tracing::info!("Icarus started");

    cancel.cancelled().await;

    dashboard.handle(LifecycleEvent::Suspended)?;
    for watcher in watchers {
        if let Err(e) = watcher.await {
            tracing::warn!("Status watcher ended abnormally: {}", e);
        }
    }
    tracing::info!("Icarus stopped");
    Ok(())
}
