//! REST client for the verification API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use silencio_core::{FetchError, FetchResult, QueryFetcher, QueryKey, VerificationRecord};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Route serving the teacher verification list.
pub const TEACHER_VERIFICATION_PATH: &str = "/api/teacher-verification";

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the body as a JSON array.
    pub async fn get_json_array<T>(&self, path: &str) -> FetchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;
        self.parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> FetchResult<Vec<T>> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::request_failed(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
            ));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;
        serde_json::from_slice::<Vec<T>>(&body).map_err(|e| FetchError::decode(e.to_string()))
    }
}

/// Fetches the teacher verification list over HTTP.
#[derive(Clone)]
pub struct VerificationFetcher {
    rest: RestClient,
}

impl VerificationFetcher {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }
}

#[async_trait]
impl QueryFetcher<Vec<VerificationRecord>> for VerificationFetcher {
    async fn fetch(&self, key: &QueryKey) -> FetchResult<Vec<VerificationRecord>> {
        tracing::debug!(key = %key, path = TEACHER_VERIFICATION_PATH, "Requesting verification data");
        let records = self
            .rest
            .get_json_array::<VerificationRecord>(TEACHER_VERIFICATION_PATH)
            .await;
        match &records {
            Ok(records) => tracing::debug!(count = records.len(), "Verification data received"),
            Err(err) => tracing::debug!(error = %err, "Verification request failed"),
        }
        records
    }
}
