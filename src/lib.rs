pub mod api;
pub mod config;
pub mod core;
pub mod log;
pub mod providers;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::rates::RateProvider;
use crate::providers::exchange_rate_api::ExchangeRateApiProvider;

/// Load configuration, build the rate provider, and serve the API until the
/// process is stopped. `host` and `port` override the configured values.
pub async fn run(config_path: Option<&str>, host: Option<&str>, port: Option<u16>) -> Result<()> {
    info!("Currency converter API starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let host = host.unwrap_or(&config.host);
    let port = port.unwrap_or(config.port);

    let provider: Arc<dyn RateProvider> =
        Arc::new(ExchangeRateApiProvider::new(&config.provider.base_url)?);

    api::run_server(host, port, provider).await
}
