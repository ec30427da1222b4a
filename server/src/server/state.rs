//! Application state for the demo-ride HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Catalog and booking stores (behind trait objects)
//! - The booking service (metrics and notifications around the stores)
//! - Token keys for the auth extractors
//! - The readiness probe and the Prometheus handle

use crate::auth::TokenKeys;
use crate::service::BookingService;
use axum::extract::FromRef;
use demoride_core::notification::Notifier;
use demoride_core::store::{BookingStore, CatalogStore};
use demoride_web::ReadinessCheck;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Users, dealers, events, sessions and fleet
    pub catalog: Arc<dyn CatalogStore>,
    /// Bookings and the capacity guard
    pub bookings: Arc<dyn BookingStore>,
    /// Reservation and lifecycle orchestration
    pub service: BookingService,
    /// Access token signing and verification
    pub tokens: Arc<TokenKeys>,
    /// Dependency probed by `GET /ready`
    pub readiness: Arc<dyn ReadinessCheck>,
    /// Scrape handle for `GET /metrics`; `None` when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// - `catalog`, `bookings`: usually the same store behind two traits
    /// - `notifier`: email delivery for rider notifications
    /// - `tokens`: access token keys
    /// - `readiness`: dependency checked by the readiness probe
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        tokens: TokenKeys,
        readiness: Arc<dyn ReadinessCheck>,
    ) -> Self {
        let service = BookingService::new(catalog.clone(), bookings.clone(), notifier);
        Self {
            catalog,
            bookings,
            service,
            tokens: Arc::new(tokens),
            readiness,
            metrics: None,
        }
    }

    /// Expose `handle` at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl FromRef<AppState> for Arc<dyn ReadinessCheck> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.readiness.clone()
    }
}
