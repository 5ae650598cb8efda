use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::rates::{RateError, RateProvider, RateSnapshot};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for an exchangerate-api.com style REST endpoint serving
/// `GET {base_url}/latest/{BASE}`.
///
/// Holds no state beyond its configuration and a preconfigured HTTP client;
/// concurrent use needs no synchronization.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: String,
    #[serde(default)]
    date: String,
    rates: HashMap<String, f64>,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cambio/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    async fn get_rates(&self, base: &str) -> Result<RateSnapshot, RateError> {
        let base = base.trim().to_uppercase();
        let url = format!("{}/latest/{}", self.base_url, base);
        debug!("Requesting exchange rates from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Rate request for {} failed: {}", base, e);
            RateError::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Rate request for {} returned HTTP {}", base, status);
            return Err(RateError::UpstreamUnavailable(format!("HTTP {status}")));
        }

        let payload: LatestRatesResponse = response.json().await.map_err(|e| {
            warn!("Could not decode rate payload for {}: {}", base, e);
            RateError::MalformedPayload(e.to_string())
        })?;

        Ok(RateSnapshot {
            base: payload.base,
            rates: payload.rates,
            date: payload.date,
        })
    }
}
