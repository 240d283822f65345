//! Normalized status data published by the poller

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

/// Namespace for session identifiers derived from session content
const SESSION_NAMESPACE: Uuid = Uuid::from_u128(0x6a1c_3e2f_94b7_4d0e_8a55_1f0b_c2d4_e871);

/// Client-side identifier of a session.
///
/// Derived from title, user and the ordinal among identical title/user
/// pairs in the same payload, so the same session keeps its id across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn derive(title: &str, user: &str, ordinal: usize) -> Self {
        let name = format!("{}\u{1f}{}\u{1f}{}", title, user, ordinal);
        SessionId(Uuid::new_v5(&SESSION_NAMESPACE, name.as_bytes()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One active stream/activity reported by an integration
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub user: String,
    /// 0–100 when the integration reports it
    pub progress_percent: Option<f64>,
    /// Path relative to the integration endpoint
    pub thumbnail_ref: Option<String>,
}

impl Session {
    /// `endpoint_url + thumbnail_ref`, when there is a non-empty reference
    pub fn full_thumbnail_url(&self, endpoint_url: &str) -> Option<String> {
        match self.thumbnail_ref.as_deref() {
            Some(thumb) if !thumb.is_empty() && !endpoint_url.is_empty() => {
                Some(format!("{}{}", endpoint_url.trim_end_matches('/'), thumb))
            }
            _ => None,
        }
    }
}

/// Raw session fields as decoded from an integration payload
#[derive(Debug, Clone, Default)]
pub struct SessionFields {
    pub title: String,
    pub user: String,
    pub progress_percent: Option<f64>,
    pub thumbnail_ref: Option<String>,
}

/// Build sessions in payload order, assigning stable ids
pub fn assign_ids(fields: Vec<SessionFields>) -> Vec<Session> {
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    fields
        .into_iter()
        .map(|f| {
            let ordinal = seen.entry((f.title.clone(), f.user.clone())).or_insert(0);
            let id = SessionId::derive(&f.title, &f.user, *ordinal);
            *ordinal += 1;
            Session {
                id,
                title: f.title,
                user: f.user,
                progress_percent: f
                    .progress_percent
                    .filter(|p| p.is_finite())
                    .map(|p| p.clamp(0.0, 100.0)),
                thumbnail_ref: f.thumbnail_ref,
            }
        })
        .collect()
}

/// Result of one successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub sessions: Vec<Session>,
    pub fetched_at_epoch_ms: u64,
}

/// What the UI should show for one integration. Exactly one state holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Loading,
    Error(String),
    Ready(PollSnapshot),
}

impl PollStatus {
    pub fn snapshot(&self) -> Option<&PollSnapshot> {
        match self {
            PollStatus::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PollStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}
