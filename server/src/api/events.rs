//! Event endpoints.
//!
//! - POST /api/events - Create an event (admin)
//! - GET /api/events - List events, soonest first
//! - GET /api/events/:id - Event details

use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use demoride_core::{Event, EventId, NewEvent};
use demoride_web::{ApiJson, AppError};

/// Create an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Spring Demo Days",
///     "location": "Circuit Carole",
///     "starts_at": "2025-04-12T08:00:00Z",
///     "ends_at": "2025-04-13T18:00:00Z",
///     "dealer_id": null
///   }'
/// ```
pub async fn create_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(event): ApiJson<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    event.validate()?;
    let event = state.catalog.create_event(event).await?;
    tracing::info!(event_id = %event.id, admin = %admin.user_id, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// All events, soonest first.
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.catalog.list_events().await?))
}

/// One event.
pub async fn get_event(
    Path(id): Path<EventId>,
    State(state): State<AppState>,
) -> Result<Json<Event>, AppError> {
    state
        .catalog
        .get_event(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Event", id))
}
