use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use tracing::info;

use cambio::api::app;
use cambio::core::rates::{RateError, RateProvider, RateSnapshot};
use cambio::providers::exchange_rate_api::ExchangeRateApiProvider;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_mock_server(base: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub const USD_RATES: &str = r#"{
        "base": "USD",
        "date": "2024-01-15",
        "rates": {"EUR": 0.85, "JPY": 110.0, "USD": 1.0}
    }"#;
}

/// Stands in for the rate client in paths that must never reach it.
struct PanickingProvider;

#[async_trait::async_trait]
impl RateProvider for PanickingProvider {
    async fn get_rates(&self, _base: &str) -> Result<RateSnapshot, RateError> {
        panic!("rate provider must not be contacted");
    }
}

/// Simulates the upstream being unreachable.
struct DownProvider;

#[async_trait::async_trait]
impl RateProvider for DownProvider {
    async fn get_rates(&self, _base: &str) -> Result<RateSnapshot, RateError> {
        Err(RateError::UpstreamUnavailable(
            "connection refused".to_string(),
        ))
    }
}

fn app_with_upstream(upstream_uri: &str) -> Router {
    let provider = ExchangeRateApiProvider::new(upstream_uri).expect("Failed to build provider");
    app(Arc::new(provider))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = serde_json::from_slice(&bytes).expect("Response body was not JSON");
    (status, body)
}

#[test_log::test(tokio::test)]
async fn test_health_check_is_independent_of_upstream() {
    // No upstream call must happen here.
    let app = app(Arc::new(PanickingProvider));

    let (status, body) = get_json(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Currency Converter API is running!");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["status"], "active");
}

#[test_log::test(tokio::test)]
async fn test_convert_happy_path() {
    let mock_server = test_utils::create_rates_mock_server("USD", test_utils::USD_RATES).await;
    let app = app_with_upstream(&mock_server.uri());

    let (status, body) = get_json(
        app,
        "/convert?from_currency=usd&to_currency=eur&amount=100",
    )
    .await;

    info!(?body, "Conversion response");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_currency"], "USD");
    assert_eq!(body["to_currency"], "EUR");
    assert_eq!(body["original_amount"].as_f64(), Some(100.0));
    assert_eq!(body["converted_amount"].as_f64(), Some(85.0));
    assert_eq!(body["exchange_rate"].as_f64(), Some(0.85));
    assert_eq!(body["timestamp"], "2024-01-15");
}

#[test_log::test(tokio::test)]
async fn test_convert_unknown_target_currency_is_a_client_error() {
    let mock_server = test_utils::create_rates_mock_server("USD", test_utils::USD_RATES).await;
    let app = app_with_upstream(&mock_server.uri());

    let (status, body) = get_json(
        app,
        "/convert?from_currency=USD&to_currency=XYZ&amount=100",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[test_log::test(tokio::test)]
async fn test_convert_rejects_non_positive_amount_before_any_network_call() {
    for query in [
        "/convert?from_currency=USD&to_currency=EUR&amount=0",
        "/convert?from_currency=USD&to_currency=EUR&amount=-5",
        "/convert?from_currency=USD&to_currency=EUR&amount=NaN",
    ] {
        // PanickingProvider turns any upstream contact into a 500.
        let app = app(Arc::new(PanickingProvider));

        let (status, body) = get_json(app, query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query: {query}");
        assert_eq!(body["detail"], "amount must be a positive number");
    }
}

#[test_log::test(tokio::test)]
async fn test_convert_rejects_empty_currency_codes() {
    let app = app(Arc::new(PanickingProvider));

    let (status, body) = get_json(app, "/convert?from_currency=&to_currency=EUR&amount=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "currency codes must not be empty");
}

#[test_log::test(tokio::test)]
async fn test_convert_with_missing_parameters_is_a_client_error() {
    let app = app(Arc::new(PanickingProvider));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/convert?from_currency=USD&amount=10")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_rates_for_base_currency() {
    let mock_response = r#"{"base": "EUR", "date": "2024-01-15", "rates": {"USD": 1.18, "GBP": 0.86}}"#;
    let mock_server = test_utils::create_rates_mock_server("EUR", mock_response).await;
    let app = app_with_upstream(&mock_server.uri());

    let (status, body) = get_json(app, "/rates/eur").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["base_currency"], "EUR");
    assert_eq!(body["rates"]["USD"].as_f64(), Some(1.18));
    assert_eq!(body["timestamp"], "2024-01-15");
}

#[test_log::test(tokio::test)]
async fn test_rates_for_unknown_base_names_the_currency() {
    // Mock serves nothing, so the lookup 404s upstream.
    let mock_server = wiremock::MockServer::start().await;
    let app = app_with_upstream(&mock_server.uri());

    let (status, body) = get_json(app, "/rates/ZZZ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "no rates found for currency: ZZZ");
}

#[test_log::test(tokio::test)]
async fn test_currencies_merges_provider_list_with_popular_table() {
    let mock_server = test_utils::create_rates_mock_server("USD", test_utils::USD_RATES).await;
    let app = app_with_upstream(&mock_server.uri());

    let (status, body) = get_json(app, "/currencies").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_currencies"], 3);
    assert_eq!(
        body["all_currencies"],
        serde_json::json!(["EUR", "JPY", "USD"])
    );
    assert_eq!(body["popular_currencies"]["USD"], "US Dollar");
    assert_eq!(
        body["popular_currencies"].as_object().map(|m| m.len()),
        Some(10)
    );
    assert_eq!(body["status"], "success");
}

#[test_log::test(tokio::test)]
async fn test_currencies_with_upstream_down_still_succeeds() {
    let app = app(Arc::new(DownProvider));

    let (status, body) = get_json(app, "/currencies").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_currencies"], 0);
    assert_eq!(body["all_currencies"], serde_json::json!([]));
    assert_eq!(
        body["popular_currencies"].as_object().map(|m| m.len()),
        Some(10)
    );
    assert_eq!(body["status"], "success");
}

#[test_log::test(tokio::test)]
async fn test_unexpected_fault_becomes_an_opaque_server_error() {
    let app = app(Arc::new(PanickingProvider));

    let (status, body) = get_json(app, "/rates/USD").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The panic message must not leak to the caller.
    assert_eq!(body["detail"], "internal server error");
}
