//! Error types for the verification client.

use crate::config::ClientConfigError;
use silencio_core::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Config(#[from] ClientConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
