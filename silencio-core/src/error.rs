//! Error types for silencio operations

use thiserror::Error;

/// Failure of a single query fetch.
///
/// Every variant is recoverable by calling again. The type is `Clone` because
/// one coalesced fetch hands the same outcome to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed with status {status}: {reason}")]
    RequestFailed { status: u16, reason: String },

    #[error("Failed to decode response body: {details}")]
    DecodeError { details: String },

    #[error("Transport error: {details}")]
    Transport { details: String },
}

impl FetchError {
    pub fn request_failed(status: u16, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            reason: reason.into(),
        }
    }

    pub fn decode(details: impl Into<String>) -> Self {
        Self::DecodeError {
            details: details.into(),
        }
    }

    pub fn transport(details: impl Into<String>) -> Self {
        Self::Transport {
            details: details.into(),
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::DecodeError { .. } | Self::Transport { .. } => None,
        }
    }

    /// No fetch failure is fatal at this layer.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
