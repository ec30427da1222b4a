//! Readiness probe and metrics scrape endpoint.

use super::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use demoride_postgres::PostgresStore;
use demoride_web::ReadinessCheck;
use std::future::Future;
use std::pin::Pin;

/// Readiness backed by a database round trip.
#[derive(Clone)]
pub struct DatabaseReadiness(pub PostgresStore);

impl ReadinessCheck for DatabaseReadiness {
    fn name(&self) -> &'static str {
        "database"
    }

    fn check(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async move { self.0.ping().await.map_err(|e| e.to_string()) })
    }
}

/// Prometheus scrape endpoint.
///
/// ```text
/// GET /metrics
/// ```
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
