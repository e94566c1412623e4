//! Web server module for the RDAP exporter.
//!
//! Serves the Prometheus scrape endpoint, a liveness probe and a small
//! landing page. Handlers only read the store; they never trigger lookups.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use prometheus::Registry;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::storage::{MetricStore, encode_text, text_content_type};

/// Path of the scrape endpoint.
pub const METRICS_PATH: &str = "/metrics";

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>RDAP Exporter</title></head>
<body>
<h1>RDAP Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub store: MetricStore,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    domains: usize,
    series: usize,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(landing_handler))
        .route(METRICS_PATH, get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}

async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Scrape endpoint: current store contents in the text exposition format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match encode_text(&state.registry) {
        Ok(body) => ([(header::CONTENT_TYPE, text_content_type())], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

/// Liveness probe.
async fn healthz_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    Json(HealthResponse {
        status: "ok".to_string(),
        domains: snapshot.domains().len(),
        series: snapshot.series_count(),
    })
}
