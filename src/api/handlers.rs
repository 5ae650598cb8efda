use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::core::rates::{popular_currencies, ConversionResult};

use super::AppState;

/// Client error carrying a human readable `detail` body, the shape the
/// dashboard reads error messages from.
pub struct BadRequest(pub String);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": self.0 }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// Liveness only; the upstream provider is deliberately not probed here.
#[axum::debug_handler]
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Currency Converter API is running!",
        version: env!("CARGO_PKG_VERSION"),
        status: "active",
    })
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
}

#[axum::debug_handler]
pub async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
) -> Result<Json<ConversionResult>, BadRequest> {
    // Input validation happens before any network call.
    if !params.amount.is_finite() || params.amount <= 0.0 {
        return Err(BadRequest("amount must be a positive number".to_string()));
    }
    if params.from_currency.trim().is_empty() || params.to_currency.trim().is_empty() {
        return Err(BadRequest("currency codes must not be empty".to_string()));
    }

    let result = state
        .provider
        .convert(&params.from_currency, &params.to_currency, params.amount)
        .await
        .map_err(|err| {
            warn!(
                "Conversion {} -> {} failed: {}",
                params.from_currency, params.to_currency, err
            );
            BadRequest("could not perform the conversion; check the requested currencies".to_string())
        })?;

    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub base_currency: String,
    pub rates: HashMap<String, f64>,
    pub timestamp: String,
}

#[axum::debug_handler]
pub async fn rates_for_base(
    State(state): State<AppState>,
    Path(base_currency): Path<String>,
) -> Result<Json<RatesResponse>, BadRequest> {
    let snapshot = state
        .provider
        .get_rates(&base_currency)
        .await
        .map_err(|err| {
            warn!("Rate lookup for {} failed: {}", base_currency, err);
            BadRequest(format!("no rates found for currency: {base_currency}"))
        })?;

    Ok(Json(RatesResponse {
        base_currency: snapshot.base,
        rates: snapshot.rates,
        timestamp: snapshot.date,
    }))
}

#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub total_currencies: usize,
    pub all_currencies: Vec<String>,
    pub popular_currencies: BTreeMap<&'static str, &'static str>,
    pub status: &'static str,
}

/// List every currency the provider knows about, plus the popular table.
///
/// A failed probe degrades the full list to empty instead of failing the
/// request, so the popular table stays available while the provider is down.
#[axum::debug_handler]
pub async fn currencies(State(state): State<AppState>) -> Json<CurrenciesResponse> {
    let all_currencies = match state.provider.get_rates("USD").await {
        Ok(snapshot) => {
            let mut codes: Vec<String> = snapshot.rates.into_keys().collect();
            codes.sort();
            codes
        }
        Err(err) => {
            warn!("Currency listing probe failed, serving empty list: {}", err);
            Vec::new()
        }
    };

    Json(CurrenciesResponse {
        total_currencies: all_currencies.len(),
        all_currencies,
        popular_currencies: popular_currencies(),
        status: "success",
    })
}
