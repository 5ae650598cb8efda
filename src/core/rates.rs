//! Exchange rate abstractions and core types

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a rate lookup produced no usable data.
///
/// The HTTP layer collapses all of these into one client-error status, but
/// keeping the causes apart lets operators and tests tell "provider down"
/// from "unknown currency".
#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate provider unreachable: {0}")]
    UpstreamUnavailable(String),
    #[error("rate provider returned an unexpected payload: {0}")]
    MalformedPayload(String),
    #[error("currency not found in rate table: {0}")]
    CurrencyNotFound(String),
}

/// The full set of rates for one base currency at a single point in time, as
/// returned by the provider in one call. Built fresh per request and
/// discarded once the response is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: HashMap<String, f64>,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub from_currency: String,
    pub to_currency: String,
    pub original_amount: f64,
    pub converted_amount: f64,
    pub exchange_rate: f64,
    pub timestamp: String,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl RateSnapshot {
    /// Convert `amount` of the snapshot's base currency into `to`.
    ///
    /// The currency lookup is case-insensitive; rounding is applied to the
    /// converted amount only, the rate itself is carried unrounded.
    pub fn convert(&self, to: &str, amount: f64) -> Result<ConversionResult, RateError> {
        let to = to.trim().to_uppercase();
        let rate = self
            .rates
            .get(&to)
            .copied()
            .ok_or_else(|| RateError::CurrencyNotFound(to.clone()))?;

        Ok(ConversionResult {
            from_currency: self.base.to_uppercase(),
            to_currency: to,
            original_amount: amount,
            converted_amount: round4(amount * rate),
            exchange_rate: rate,
            timestamp: self.date.clone(),
        })
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch a fresh snapshot of all rates for `base`. One upstream round
    /// trip, no caching, no retries.
    async fn get_rates(&self, base: &str) -> Result<RateSnapshot, RateError>;

    /// Convert `amount` between two currencies using a fresh snapshot for
    /// `from`. Callers validate the amount before invoking this.
    async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<ConversionResult, RateError> {
        let snapshot = self.get_rates(from).await?;
        snapshot.convert(to, amount)
    }
}

const POPULAR_CURRENCIES: [(&str, &str); 10] = [
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("AUD", "Australian Dollar"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Yuan"),
    ("COP", "Colombian Peso"),
    ("MXN", "Mexican Peso"),
];

/// Display names for commonly traded currencies. Static for the process
/// lifetime and independent of the provider, so it stays available offline.
pub fn popular_currencies() -> BTreeMap<&'static str, &'static str> {
    POPULAR_CURRENCIES.into_iter().collect()
}
