//! Booking endpoints.
//!
//! - POST /api/bookings - Reserve a motorcycle at a session (any account)
//! - GET /api/bookings/mine - The caller's bookings, newest first
//! - GET /api/bookings/:id - One booking (owner or staff)
//! - POST /api/bookings/:id/cancel - Cancel and free the seat (owner or staff)
//! - POST /api/bookings/:id/status - Any lifecycle transition (staff)
//!
//! # Lifecycle
//!
//! ```text
//! RESERVED → CONFIRMED → IN_PROGRESS → COMPLETED
//!     ↓          ↓
//!  CANCELLED / NO_SHOW
//! ```

use crate::auth::{AuthUser, RequireStaff};
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use demoride_core::lifecycle::BookingAction;
use demoride_core::{Booking, BookingId, BookingStatus, FieldError, MotorcycleId, SessionId};
use demoride_web::{ApiJson, AppError, CorrelationId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to reserve a motorcycle.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Target session
    pub session_id: SessionId,
    /// Motorcycle to ride
    pub motorcycle_id: MotorcycleId,
}

/// Request to cancel a booking.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    /// Optional reason shown to the rider
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request to move a booking to another status.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    /// Target status
    pub status: BookingStatus,
    /// Reason, used when cancelling
    #[serde(default)]
    pub reason: Option<String>,
}

/// Booking after a status change, with the session's seat count.
#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    /// The booking
    pub booking: Booking,
    /// Seats taken in its session after the change
    pub booked_slots: u32,
    /// Seats left in its session after the change
    pub remaining_slots: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reserve a motorcycle at a session for the caller.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"session_id":"…","motorcycle_id":"…"}'
/// ```
///
/// Refusals answer 400 with a stable code: `SLOT_FULL`,
/// `BOOKING_LIMIT_REACHED`, `MOTORCYCLE_UNAVAILABLE`,
/// `MOTORCYCLE_INCOMPATIBLE` or `LICENSE_INSUFFICIENT`.
pub async fn create_booking(
    user: AuthUser,
    correlation_id: CorrelationId,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    tracing::debug!(
        correlation_id = %correlation_id.0,
        session_id = %request.session_id,
        motorcycle_id = %request.motorcycle_id,
        "Reservation requested"
    );
    let booking = state
        .service
        .reserve(user.user_id, request.session_id, request.motorcycle_id)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// The caller's bookings, all statuses, newest first.
pub async fn my_bookings(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_bookings_for_user(user.user_id).await?))
}

/// One booking, visible to its owner and to staff.
pub async fn get_booking(
    user: AuthUser,
    Path(id): Path<BookingId>,
    State(state): State<AppState>,
) -> Result<Json<Booking>, AppError> {
    load_for(&state, &user, id).await.map(Json)
}

/// Cancel a booking and give its seat back.
///
/// The body is optional: `{"reason": "..."}`.
pub async fn cancel_booking(
    user: AuthUser,
    Path(id): Path<BookingId>,
    State(state): State<AppState>,
    body: Option<ApiJson<CancelBookingRequest>>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    load_for(&state, &user, id).await?;
    let reason = body.and_then(|ApiJson(request)| request.reason);

    let applied = state
        .service
        .transition(id, BookingAction::Cancel { reason })
        .await?;
    tracing::info!(booking_id = %id, by = %user.user_id, "Booking cancelled");

    Ok(Json(StatusChangeResponse {
        remaining_slots: applied.session.remaining_slots(),
        booked_slots: applied.session.booked_slots,
        booking: applied.booking,
    }))
}

/// Move a booking along its lifecycle.
pub async fn change_status(
    RequireStaff(staff): RequireStaff,
    Path(id): Path<BookingId>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangeStatusRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let Some(action) = BookingAction::for_status(request.status, request.reason) else {
        return Err(AppError::validation(vec![FieldError::new(
            "status",
            "RESERVED is only set when a booking is created",
        )]));
    };

    let applied = state.service.transition(id, action).await?;
    tracing::info!(
        booking_id = %id,
        status = %applied.booking.status,
        by = %staff.user_id,
        "Booking status set by staff"
    );

    Ok(Json(StatusChangeResponse {
        remaining_slots: applied.session.remaining_slots(),
        booked_slots: applied.session.booked_slots,
        booking: applied.booking,
    }))
}

/// Load a booking the caller may see.
///
/// Strangers get 403, missing bookings 404.
async fn load_for(state: &AppState, user: &AuthUser, id: BookingId) -> Result<Booking, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking", id))?;

    if user.can_access(&booking) {
        Ok(booking)
    } else {
        Err(AppError::forbidden("This booking belongs to another rider"))
    }
}
