//! Router configuration for the demo-ride platform.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::metrics;
use super::state::AppState;
use crate::api::{bookings, dealers, events, exports, motorcycles, sessions};
use crate::auth::handlers as auth;
use axum::{
    routing::{get, post},
    Router,
};
use demoride_web::{health_check, readiness, request_tracking_layer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - Health, readiness and metrics at the root
/// - Everything else under `/api`
/// - Every request tracked (correlation ID, span, request metrics)
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route(
            "/dealers",
            post(dealers::create_dealer).get(dealers::list_dealers),
        )
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route(
            "/events/:id/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/motorcycles",
            post(motorcycles::create_motorcycle).get(motorcycles::list_motorcycles),
        )
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/mine", get(bookings::my_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/status", post(bookings::change_status))
        // Staff views
        .route("/sessions/:id/bookings", get(sessions::session_bookings))
        .route("/events/:id/bookings.csv", get(exports::event_bookings_csv));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(request_tracking_layer())
        .with_state(state)
}
