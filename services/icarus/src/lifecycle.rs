//! Host lifecycle events the dashboard reacts to

use crate::settings::RefreshInterval;

/// Something that happened to the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The status view was shown for the first time
    Appeared,
    /// The process came back to the foreground
    Resumed,
    /// The process went to the background
    Suspended,
    /// The user picked a different refresh interval
    IntervalChanged(RefreshInterval),
}

/// What the dashboard does with its schedulers in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    StartAll,
    StopAll,
    /// Restart only the schedulers that are currently polling
    RestartPolling(RefreshInterval),
}

impl LifecycleEvent {
    pub fn action(&self) -> LifecycleAction {
        match self {
            LifecycleEvent::Appeared | LifecycleEvent::Resumed => LifecycleAction::StartAll,
            LifecycleEvent::Suspended => LifecycleAction::StopAll,
            LifecycleEvent::IntervalChanged(interval) => LifecycleAction::RestartPolling(*interval),
        }
    }
}
