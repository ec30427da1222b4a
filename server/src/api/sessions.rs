//! Session endpoints.
//!
//! - POST /api/events/:id/sessions - Add a session to an event (admin)
//! - GET /api/events/:id/sessions - Sessions of an event with remaining seats
//! - GET /api/sessions/:id/bookings - Bookings of a session (staff)

use crate::auth::{RequireAdmin, RequireStaff};
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use demoride_core::{Booking, EventId, NewSession, Session, SessionId, UserId};
use demoride_web::{ApiJson, AppError};
use serde::{Deserialize, Serialize};

/// Request to add a session; the event comes from the path.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Slot start
    pub starts_at: DateTime<Utc>,
    /// Slot end
    pub ends_at: DateTime<Utc>,
    /// Motorcycle group accepted
    pub group_tag: String,
    /// Capacity
    pub available_slots: u32,
    /// Instructor leading the ride
    #[serde(default)]
    pub instructor_id: Option<UserId>,
}

/// A session with its remaining seats.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The session
    #[serde(flatten)]
    pub session: Session,
    /// `available_slots - booked_slots`
    pub remaining_slots: u32,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            remaining_slots: session.remaining_slots(),
            session,
        }
    }
}

/// Add a session to an event.
pub async fn create_session(
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<EventId>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = NewSession {
        event_id,
        starts_at: request.starts_at,
        ends_at: request.ends_at,
        group_tag: request.group_tag,
        available_slots: request.available_slots,
        instructor_id: request.instructor_id,
    };
    session.validate()?;

    let session = state.catalog.create_session(session).await?;
    tracing::info!(
        session_id = %session.id,
        event_id = %event_id,
        slots = session.available_slots,
        admin = %admin.user_id,
        "Session created"
    );
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Sessions of an event, by start time.
pub async fn list_sessions(
    Path(event_id): Path<EventId>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    if state.catalog.get_event(event_id).await?.is_none() {
        return Err(AppError::not_found("Event", event_id));
    }
    let sessions = state.catalog.list_sessions(event_id).await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// Bookings of a session, all statuses, oldest first.
pub async fn session_bookings(
    _staff: RequireStaff,
    Path(session_id): Path<SessionId>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booking>>, AppError> {
    if state.catalog.get_session(session_id).await?.is_none() {
        return Err(AppError::not_found("Session", session_id));
    }
    Ok(Json(state.bookings.list_bookings_for_session(session_id).await?))
}
