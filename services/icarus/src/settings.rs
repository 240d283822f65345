//! Flat key-value settings persistence and user preferences
//!
//! Credentials and preferences share one flat namespace of keys. The
//! repository is injected wherever settings are read so tests can swap the
//! on-disk store for [`MemorySettings`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde_json::{Map, Value};

pub const REFRESH_INTERVAL_KEY: &str = "refreshInterval";
pub const APPEARANCE_MODE_KEY: &str = "appearanceMode";

/// Process-wide flat settings store. Every operation is atomic per key.
pub trait SettingsRepository: Send + Sync + fmt::Debug {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, overwriting any previous value
    fn set(&self, key: &str, value: Value) -> crate::Result<()>;

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// In-memory settings, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsRepository for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> crate::Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a single flat JSON object on disk.
///
/// The whole object is rewritten on every `set`, through a temporary file
/// and a rename, while holding the lock.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileSettings {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                crate::IcarusError::Settings(format!(
                    "Failed to read settings file {:?}: {}",
                    path, e
                ))
            })?;
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                other => {
                    return Err(crate::IcarusError::Settings(format!(
                        "Settings file {:?} must hold a JSON object, found {}",
                        path,
                        json_kind(&other)
                    )))
                }
            }
        } else {
            tracing::debug!("Settings file {:?} does not exist, starting empty", path);
            Map::new()
        };

        tracing::debug!("Opened settings {:?} ({} keys)", path, values.len());
        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsRepository for JsonFileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> crate::Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = values.insert(key.to_string(), value);
        if let Err(e) = self.persist(&values) {
            // keep memory and disk in agreement
            match previous {
                Some(previous) => values.insert(key.to_string(), previous),
                None => values.remove(key),
            };
            return Err(crate::IcarusError::Settings(format!(
                "Failed to write settings file {:?}: {}",
                self.path, e
            )));
        }
        tracing::debug!("Stored settings key '{}'", key);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// How often the dashboard polls, restricted to the choices the UI offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshInterval {
    TenSeconds,
    #[default]
    ThirtySeconds,
    OneMinute,
    TwoMinutes,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 4] = [
        RefreshInterval::TenSeconds,
        RefreshInterval::ThirtySeconds,
        RefreshInterval::OneMinute,
        RefreshInterval::TwoMinutes,
    ];

    pub fn seconds(&self) -> u64 {
        match self {
            RefreshInterval::TenSeconds => 10,
            RefreshInterval::ThirtySeconds => 30,
            RefreshInterval::OneMinute => 60,
            RefreshInterval::TwoMinutes => 120,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = crate::IcarusError;

    fn try_from(seconds: u64) -> Result<Self, Self::Error> {
        RefreshInterval::ALL
            .into_iter()
            .find(|i| i.seconds() == seconds)
            .ok_or_else(|| {
                crate::IcarusError::InvalidValue(format!(
                    "refresh interval must be one of 10, 30, 60 or 120 seconds, got {}",
                    seconds
                ))
            })
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sec", self.seconds())
    }
}

/// Colour scheme preference. Stored for the UI, never applied here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppearanceMode {
    #[default]
    System,
    Light,
    Dark,
}

impl AppearanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppearanceMode::System => "system",
            AppearanceMode::Light => "light",
            AppearanceMode::Dark => "dark",
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppearanceMode {
    type Err = crate::IcarusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(AppearanceMode::System),
            "light" => Ok(AppearanceMode::Light),
            "dark" => Ok(AppearanceMode::Dark),
            other => Err(crate::IcarusError::InvalidValue(format!(
                "appearance mode must be system, light or dark, got '{}'",
                other
            ))),
        }
    }
}

/// Preferences shared by every integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub refresh_interval: RefreshInterval,
    pub appearance_mode: AppearanceMode,
}

impl Preferences {
    /// Read preferences, falling back to defaults for missing or unusable values
    pub fn load(repo: &dyn SettingsRepository) -> Self {
        let refresh_interval = match repo.get(REFRESH_INTERVAL_KEY) {
            None => RefreshInterval::default(),
            Some(value) => match value.as_u64().map(RefreshInterval::try_from) {
                Some(Ok(interval)) => interval,
                _ => {
                    tracing::warn!(
                        "Ignoring stored {} value {}, using default",
                        REFRESH_INTERVAL_KEY,
                        value
                    );
                    RefreshInterval::default()
                }
            },
        };

        let appearance_mode = match repo.get_string(APPEARANCE_MODE_KEY) {
            None => AppearanceMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored {}: {}", APPEARANCE_MODE_KEY, e);
                AppearanceMode::default()
            }),
        };

        Self {
            refresh_interval,
            appearance_mode,
        }
    }

    pub fn save(&self, repo: &dyn SettingsRepository) -> crate::Result<()> {
        repo.set(
            REFRESH_INTERVAL_KEY,
            Value::from(self.refresh_interval.seconds()),
        )?;
        repo.set(
            APPEARANCE_MODE_KEY,
            Value::from(self.appearance_mode.as_str()),
        )?;
        Ok(())
    }
}
