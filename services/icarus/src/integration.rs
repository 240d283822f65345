//! The media-server services icarus knows how to talk to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One external media-management service with its own endpoint/key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Integration {
    Tautulli,
    Radarr,
    Sonarr,
    Overseerr,
    SabNzb,
    Plex,
}

impl Integration {
    pub const ALL: [Integration; 6] = [
        Integration::Tautulli,
        Integration::Radarr,
        Integration::Sonarr,
        Integration::Overseerr,
        Integration::SabNzb,
        Integration::Plex,
    ];

    /// Display name, also used as the suffix of the persisted settings keys
    pub fn name(&self) -> &'static str {
        match self {
            Integration::Tautulli => "Tautulli",
            Integration::Radarr => "Radarr",
            Integration::Sonarr => "Sonarr",
            Integration::Overseerr => "Overseerr",
            Integration::SabNzb => "SabNZB",
            Integration::Plex => "Plex",
        }
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Integration {
    type Err = crate::IcarusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Integration::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::IcarusError::InvalidValue(format!("unknown integration '{}'", s)))
    }
}

impl TryFrom<String> for Integration {
    type Error = crate::IcarusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Integration> for String {
    fn from(value: Integration) -> Self {
        value.name().to_string()
    }
}
