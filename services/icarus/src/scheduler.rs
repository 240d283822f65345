//! Poll scheduler: one cancellable repeating fetch task per integration
//!
//! The scheduler owns the latest [`PollStatus`] and publishes it through a
//! `watch` channel. Ticks inside one task run back to back, missed timer
//! ticks are skipped, and every tick carries a sequence number so a result
//! from a superseded task can never overwrite a newer one.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialStore;
use crate::fetcher::StatusFetcher;
use crate::integration::Integration;
use crate::session::PollStatus;

/// Consecutive failures after which a warning is logged
const FAILURE_WARN_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Never started
    Idle,
    Polling,
    /// Stopped; inert until the next `start`
    Stopped,
}

/// Last-write-wins publisher keyed by tick sequence
#[derive(Debug)]
pub struct StatusPublisher {
    tx: watch::Sender<PollStatus>,
    last_tick: AtomicU64,
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PollStatus::Loading);
        Self {
            tx,
            last_tick: AtomicU64::new(0),
        }
    }

    /// Publish `status` produced by tick `tick`. Returns false, leaving the
    /// current status untouched, when a newer tick has already published or
    /// `cancel` has fired.
    pub fn publish(&self, tick: u64, status: PollStatus, cancel: &CancellationToken) -> bool {
        let mut status = Some(status);
        self.tx.send_if_modified(|current| {
            // runs under the channel lock, so check-and-set is atomic
            if cancel.is_cancelled() || tick <= self.last_tick.load(Ordering::Relaxed) {
                return false;
            }
            self.last_tick.store(tick, Ordering::Relaxed);
            if let Some(status) = status.take() {
                *current = status;
            }
            true
        })
    }

    /// Block until any publish holding the channel lock has finished
    fn fence(&self) {
        self.tx.send_if_modified(|_| false);
    }

    pub fn current(&self) -> PollStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.tx.subscribe()
    }
}

#[derive(Debug)]
struct Shared {
    integration: Integration,
    credentials: CredentialStore,
    fetcher: Arc<dyn StatusFetcher>,
    publisher: StatusPublisher,
    ticks: AtomicU64,
    consecutive_failures: AtomicU32,
}

impl Shared {
    /// Load the credential, fetch once and turn the outcome into a status
    async fn run_tick(&self, period: Duration) -> PollStatus {
        let credential = self.credentials.load(self.integration);
        match self.fetcher.fetch_status(&credential).await {
            Ok(snapshot) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                tracing::debug!(
                    "Poll '{}': {} session(s)",
                    self.integration,
                    snapshot.sessions.len()
                );
                PollStatus::Ready(snapshot)
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures == FAILURE_WARN_THRESHOLD {
                    tracing::warn!(
                        "Integration '{}' has {} consecutive failures: {}",
                        self.integration,
                        failures,
                        e
                    );
                } else {
                    tracing::debug!("Poll '{}' failed: {}", self.integration, e);
                }
                PollStatus::Error(retry_message(self.integration, &e, period))
            }
        }
    }
}

/// User-facing error text announcing the next retry
pub fn retry_message(integration: Integration, error: &crate::FetchError, period: Duration) -> String {
    format!(
        "{}: {}. Retrying in {} sec...",
        integration,
        error,
        period.as_secs()
    )
}

#[derive(Debug)]
struct RunningTask {
    cancel: CancellationToken,
    // kept so the task is owned here; it is never aborted
    _handle: JoinHandle<()>,
}

#[derive(Debug)]
struct Control {
    state: SchedulerState,
    task: Option<RunningTask>,
}

/// Drives the fetcher for one integration on a repeating timer
#[derive(Debug)]
pub struct PollScheduler {
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

impl PollScheduler {
    pub fn new(
        integration: Integration,
        credentials: CredentialStore,
        fetcher: Arc<dyn StatusFetcher>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                integration,
                credentials,
                fetcher,
                publisher: StatusPublisher::new(),
                ticks: AtomicU64::new(0),
                consecutive_failures: AtomicU32::new(0),
            }),
            control: Mutex::new(Control {
                state: SchedulerState::Idle,
                task: None,
            }),
        }
    }

    pub fn integration(&self) -> Integration {
        self.shared.integration
    }

    /// Fetch now, then every `interval`. Cancels any previous timer first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, interval: Duration) -> crate::Result<()> {
        if interval.is_zero() {
            return Err(crate::IcarusError::InvalidValue(
                "polling interval must be greater than zero".to_string(),
            ));
        }

        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = control.task.take() {
            tracing::debug!("Restarting poller for '{}'", self.shared.integration);
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            interval,
            cancel.clone(),
        ));
        control.task = Some(RunningTask {
            cancel,
            _handle: handle,
        });
        control.state = SchedulerState::Polling;

        tracing::info!(
            "Polling '{}' every {} sec",
            self.shared.integration,
            interval.as_secs()
        );
        Ok(())
    }

    /// Cancel the timer. An in-flight fetch completes and its result is dropped.
    pub fn stop(&self) {
        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = control.task.take() {
            task.cancel.cancel();
            self.shared.publisher.fence();
            tracing::info!("Stopped polling '{}'", self.shared.integration);
        }
        control.state = SchedulerState::Stopped;
    }

    pub fn state(&self) -> SchedulerState {
        self.control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Latest published status
    pub fn status(&self) -> PollStatus {
        self.shared.publisher.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.shared.publisher.subscribe()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        let control = self.control.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = control.task.take() {
            task.cancel.cancel();
        }
    }
}

async fn poll_loop(shared: Arc<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let tick = shared.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let status = shared.run_tick(period).await;

        if !shared.publisher.publish(tick, status, &cancel) {
            tracing::debug!(
                "Discarding result of tick {} for '{}': stale or poller stopped",
                tick,
                shared.integration
            );
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    tracing::debug!("Polling loop for '{}' finished", shared.integration);
}
