//! HTTP surface: routes and outcome-to-status mapping.

pub mod handlers;

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::core::rates::RateProvider;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn RateProvider>,
}

/// Build the application router. The permissive CORS layer lets a browser
/// dashboard on another origin consume the API directly.
pub fn app(provider: Arc<dyn RateProvider>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/convert", get(handlers::convert))
        .route("/rates/:base_currency", get(handlers::rates_for_base))
        .route("/currencies", get(handlers::currencies))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(AppState { provider })
}

// Unexpected faults become an opaque 500; the detail only goes to the log.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Request handler panicked: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "internal server error" })),
    )
        .into_response()
}

pub async fn run_server(host: &str, port: u16, provider: Arc<dyn RateProvider>) -> Result<()> {
    let app = app(provider);

    let bind_address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
