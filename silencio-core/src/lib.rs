//! silencio Core - Query Types
//!
//! Data types shared by the query cache and the HTTP client. This crate holds
//! no I/O: records, keys, the error taxonomy, query configuration and the
//! fetcher seam that the cache calls through.

pub mod config;
pub mod entities;
pub mod error;
pub mod fetcher;

pub use config::{BackoffConfig, QueryConfig};
pub use entities::{QueryKey, VerificationRecord, TEACHER_VERIFICATION_KEY};
pub use error::{ConfigError, FetchError, FetchResult};
pub use fetcher::QueryFetcher;
