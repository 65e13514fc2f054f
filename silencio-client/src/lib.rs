//! HTTP client for teacher verification data.
//!
//! Wraps the `/api/teacher-verification` endpoint in a [`VerificationDataClient`]
//! backed by the shared query cache from `silencio-cache`.

pub mod api_client;
pub mod config;
pub mod error;
pub mod verification;

pub use api_client::{RestClient, VerificationFetcher, TEACHER_VERIFICATION_PATH};
pub use config::{ClientConfig, ClientConfigError};
pub use error::ClientError;
pub use verification::{Records, VerificationCache, VerificationDataClient};
