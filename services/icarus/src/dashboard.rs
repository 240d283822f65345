//! Dashboard: owns one scheduler per polled integration and applies
//! host lifecycle events to all of them

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::credentials::{Credential, CredentialStore};
use crate::integration::Integration;
use crate::lifecycle::{LifecycleAction, LifecycleEvent};
use crate::scheduler::{PollScheduler, SchedulerState};
use crate::session::PollStatus;
use crate::settings::RefreshInterval;

#[derive(Debug)]
pub struct Dashboard {
    schedulers: Vec<Arc<PollScheduler>>,
    credentials: CredentialStore,
    interval: Mutex<RefreshInterval>,
}

impl Dashboard {
    pub fn new(
        schedulers: Vec<Arc<PollScheduler>>,
        credentials: CredentialStore,
        interval: RefreshInterval,
    ) -> Self {
        Self {
            schedulers,
            credentials,
            interval: Mutex::new(interval),
        }
    }

    pub fn credential(&self, integration: Integration) -> Credential {
        self.credentials.load(integration)
    }

    pub fn integrations(&self) -> Vec<Integration> {
        self.schedulers.iter().map(|s| s.integration()).collect()
    }

    pub fn interval(&self) -> RefreshInterval {
        *self.interval.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scheduler(&self, integration: Integration) -> Option<&Arc<PollScheduler>> {
        self.schedulers
            .iter()
            .find(|s| s.integration() == integration)
    }

    pub fn status(&self, integration: Integration) -> Option<PollStatus> {
        self.scheduler(integration).map(|s| s.status())
    }

    pub fn subscribe(&self, integration: Integration) -> Option<watch::Receiver<PollStatus>> {
        self.scheduler(integration).map(|s| s.subscribe())
    }

    /// Translate a lifecycle event into scheduler calls
    pub fn handle(&self, event: LifecycleEvent) -> crate::Result<()> {
        tracing::debug!("Lifecycle event {:?}", event);
        match event.action() {
            LifecycleAction::StartAll => self.start_all(),
            LifecycleAction::StopAll => {
                self.stop_all();
                Ok(())
            }
            LifecycleAction::RestartPolling(interval) => {
                *self.interval.lock().unwrap_or_else(PoisonError::into_inner) = interval;
                for scheduler in &self.schedulers {
                    if scheduler.state() == SchedulerState::Polling {
                        scheduler.start(interval.as_duration())?;
                    }
                }
                Ok(())
            }
        }
    }

    pub fn start_all(&self) -> crate::Result<()> {
        let interval = self.interval();
        for scheduler in &self.schedulers {
            scheduler.start(interval.as_duration())?;
        }
        Ok(())
    }

    pub fn stop_all(&self) {
        for scheduler in &self.schedulers {
            scheduler.stop();
        }
    }
}

/// Human-readable lines for one integration's status
pub fn describe_status(
    integration: Integration,
    status: &PollStatus,
    endpoint_url: &str,
) -> Vec<String> {
    match status {
        PollStatus::Loading => vec![format!("Loading {} activity...", integration)],
        PollStatus::Error(message) => vec![message.clone()],
        PollStatus::Ready(snapshot) if snapshot.sessions.is_empty() => {
            vec![format!("{}: no active sessions", integration)]
        }
        PollStatus::Ready(snapshot) => {
            let mut lines = vec![format!(
                "{}: {} active session(s)",
                integration,
                snapshot.sessions.len()
            )];
            lines.extend(snapshot.sessions.iter().map(|s| {
                let mut line = format!("  {} (User: {})", s.title, s.user);
                if let Some(progress) = s.progress_percent {
                    line.push_str(&format!(" {:.0}%", progress));
                }
                if let Some(thumb) = s.full_thumbnail_url(endpoint_url) {
                    line.push_str(&format!(" [{}]", thumb));
                }
                line
            }));
            lines
        }
    }
}
