//! silencio-verify entry point.
//!
//! Loads the client configuration, fetches the teacher verification list once
//! and prints it to stdout as JSON.

use std::time::Duration;

use silencio_cache::spawn_collector;
use silencio_client::config::ClientConfig;
use silencio_client::error::ClientError;
use silencio_client::verification::{VerificationCache, VerificationDataClient};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "silencio_client=info,silencio_cache=info";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    init_logging()?;

    let config = ClientConfig::load()?;
    let cache = VerificationCache::new(config.refresh_backoff.clone());
    let client = VerificationDataClient::from_config(&config, cache.clone())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = spawn_collector(
        cache.clone(),
        Duration::from_millis(config.gc_interval_ms),
        shutdown_rx,
    );

    let result = client.get_verification_data(true).await;

    let _ = shutdown_tx.send(true);
    if let Err(err) = collector.await {
        tracing::warn!(error = %err, "Query collector did not stop cleanly");
    }

    let records = match result {
        Ok(outcome) => outcome.into_data().unwrap_or_default(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to load verification data");
            return Err(err.into());
        }
    };

    tracing::info!(
        count = records.len(),
        base_url = %config.api_base_url,
        "Loaded verification data"
    );
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Log to stderr so stdout carries only the JSON output.
fn init_logging() -> Result<(), ClientError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ClientError::Logging(e.to_string()))
}
