//! CSV export of an event's bookings.
//!
//! - GET /api/events/:id/bookings.csv - One row per booking (staff)
//!
//! The header row is always present, even for an event without bookings.

use crate::auth::RequireStaff;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use demoride_core::{Booking, EventId, MotorcycleId, SessionId, UserId};
use demoride_web::AppError;
use std::collections::HashMap;

/// Column names, in order.
pub const HEADER: [&str; 7] = [
    "booking_id",
    "session_starts_at",
    "rider_name",
    "rider_email",
    "motorcycle_model",
    "status",
    "created_at",
];

/// One exported booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// Booking reference
    pub booking_id: String,
    /// Session start
    pub session_starts_at: DateTime<Utc>,
    /// "First Last"
    pub rider_name: String,
    /// Rider email
    pub rider_email: String,
    /// Motorcycle model
    pub motorcycle_model: String,
    /// Status label
    pub status: &'static str,
    /// Booking creation time
    pub created_at: DateTime<Utc>,
}

/// Render rows as CSV text.
///
/// # Errors
///
/// Fails only if the writer cannot flush into memory.
pub fn render_csv(rows: &[ExportRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for row in rows {
        let session_starts_at = row.session_starts_at.to_rfc3339();
        let created_at = row.created_at.to_rfc3339();
        writer.write_record([
            row.booking_id.as_str(),
            session_starts_at.as_str(),
            row.rider_name.as_str(),
            row.rider_email.as_str(),
            row.motorcycle_model.as_str(),
            row.status,
            created_at.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Download every booking of an event as CSV.
pub async fn event_bookings_csv(
    _staff: RequireStaff,
    Path(event_id): Path<EventId>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if state.catalog.get_event(event_id).await?.is_none() {
        return Err(AppError::not_found("Event", event_id));
    }

    let bookings = state.bookings.list_bookings_for_event(event_id).await?;
    let rows = export_rows(&state, &bookings).await?;
    let body = render_csv(&rows)?;

    tracing::info!(event_id = %event_id, rows = rows.len(), "Bookings exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"event-{event_id}-bookings.csv\""),
            ),
        ],
        body,
    ))
}

/// Resolve the names behind each booking, loading each record once.
async fn export_rows(state: &AppState, bookings: &[Booking]) -> Result<Vec<ExportRow>, AppError> {
    let mut sessions: HashMap<SessionId, DateTime<Utc>> = HashMap::new();
    let mut riders: HashMap<UserId, (String, String)> = HashMap::new();
    let mut models: HashMap<MotorcycleId, String> = HashMap::new();
    let mut rows = Vec::with_capacity(bookings.len());

    for booking in bookings {
        if !sessions.contains_key(&booking.session_id) {
            let session = state
                .catalog
                .get_session(booking.session_id)
                .await?
                .ok_or_else(|| AppError::not_found("Session", booking.session_id))?;
            sessions.insert(session.id, session.starts_at);
        }
        if !riders.contains_key(&booking.user_id) {
            let rider = state
                .catalog
                .get_user(booking.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("User", booking.user_id))?;
            riders.insert(rider.id, (rider.full_name(), rider.email));
        }
        if !models.contains_key(&booking.motorcycle_id) {
            let motorcycle = state
                .catalog
                .get_motorcycle(booking.motorcycle_id)
                .await?
                .ok_or_else(|| AppError::not_found("Motorcycle", booking.motorcycle_id))?;
            models.insert(motorcycle.id, motorcycle.model);
        }

        let (rider_name, rider_email) = riders
            .get(&booking.user_id)
            .cloned()
            .unwrap_or_default();
        rows.push(ExportRow {
            booking_id: booking.id.to_string(),
            session_starts_at: sessions
                .get(&booking.session_id)
                .copied()
                .unwrap_or_default(),
            rider_name,
            rider_email,
            motorcycle_model: models
                .get(&booking.motorcycle_id)
                .cloned()
                .unwrap_or_default(),
            status: booking.status.as_str(),
            created_at: booking.created_at,
        });
    }

    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(name: &str) -> ExportRow {
        let at = Utc.with_ymd_and_hms(2025, 4, 12, 9, 30, 0).unwrap();
        ExportRow {
            booking_id: "b-1".into(),
            session_starts_at: at,
            rider_name: name.into(),
            rider_email: "alex@example.com".into(),
            motorcycle_model: "MT-07".into(),
            status: "RESERVED",
            created_at: at,
        }
    }

    #[test]
    fn header_present_without_rows() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "booking_id,session_starts_at,rider_name,rider_email,motorcycle_model,status,created_at\n"
        );
    }

    #[test]
    fn one_line_per_row() {
        let csv = render_csv(&[row("Alex Martin"), row("Sam Rider")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "b-1,2025-04-12T09:30:00+00:00,Alex Martin,alex@example.com,MT-07,RESERVED,2025-04-12T09:30:00+00:00"
        );
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let csv = render_csv(&[row("Martin, Alex")]).unwrap();
        assert!(csv.contains("\"Martin, Alex\""));
    }
}
