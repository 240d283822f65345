//! Error types for the icarus poller

/// Errors raised by the ambient layers (config, settings, HTTP transport)
#[derive(Debug, thiserror::Error)]
pub enum IcarusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for icarus operations
pub type Result<T> = std::result::Result<T, IcarusError>;

/// Why a single status fetch failed.
///
/// Every variant is recovered by the scheduler and turned into a status
/// message; none of them stop polling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("API is not configured")]
    NotConfigured,

    #[error("API URL is invalid")]
    InvalidUrl,

    #[error("Network error: {0}")]
    TransportError(String),

    #[error("Server returned status {0}")]
    ServerError(u16),

    #[error("Unexpected response: {0}")]
    DecodeError(String),
}
