//! Error types for web handlers.
//!
//! Bridges [`BookingError`] and HTTP responses through Axum's `IntoResponse`.
//! Every error body has the same shape:
//!
//! ```json
//! { "code": "SLOT_FULL", "message": "This session is fully booked", "fields": [] }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use demoride_core::{BookingError, FieldError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Event>, AppError> {
///     let event = store.get_event(id).await?
///         .ok_or_else(|| AppError::not_found("Event", id))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Invalid input fields (validation errors only)
    fields: Vec<FieldError>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            fields: Vec::new(),
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 400 error carrying a business rule code.
    #[must_use]
    pub fn rejected(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), code.to_string())
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code.to_string())
    }

    /// Create a 422 Unprocessable Entity error listing the invalid fields.
    #[must_use]
    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = if fields.is_empty() {
            "Request body is invalid".to_string()
        } else {
            fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("; ")
        };
        let mut error = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
            "VALIDATION_ERROR".to_string(),
        );
        error.fields = fields;
        error
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A field error in a response body.
#[derive(Debug, Serialize)]
struct FieldErrorBody {
    field: String,
    message: String,
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Invalid fields, empty unless `code` is `VALIDATION_ERROR`.
    fields: Vec<FieldErrorBody>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        } else {
            tracing::debug!(status = %self.status, code = %self.code, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            fields: self
                .fields
                .into_iter()
                .map(|f| FieldErrorBody {
                    field: f.field,
                    message: f.message,
                })
                .collect(),
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map domain errors onto status codes and stable codes.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let code = err.code();
        match err {
            BookingError::SlotFull { .. } => {
                Self::rejected(code, "This session is fully booked")
            },
            BookingError::BookingLimitReached { limit, .. } => Self::rejected(
                code,
                format!("You already hold {limit} bookings for this event"),
            ),
            BookingError::MotorcycleUnavailable { .. } => Self::rejected(
                code,
                "This motorcycle is already booked for this session",
            ),
            BookingError::MotorcycleIncompatible { .. }
            | BookingError::LicenseInsufficient { .. } => {
                let message = err.to_string();
                Self::rejected(code, message)
            },
            BookingError::InvalidTransition { .. } | BookingError::Conflict(_) => {
                let message = err.to_string();
                Self::conflict(code, message)
            },
            BookingError::NotFound { resource, id } => Self::not_found(resource, id),
            BookingError::Validation(fields) => Self::validation(fields),
            BookingError::Storage(detail) => Self::internal("An internal error occurred")
                .with_source(anyhow::anyhow!(detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demoride_core::{BookingStatus, SessionId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Event", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Event with id 123 not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_keeps_fields() {
        let err = AppError::validation(vec![FieldError::new("email", "must not be empty")]);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.fields.len(), 1);
        assert_eq!(err.message, "email: must not be empty");
    }

    #[test]
    fn test_capacity_rejections_are_bad_requests() {
        let err = AppError::from(BookingError::SlotFull {
            session_id: SessionId::new(),
            capacity: 4,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "SLOT_FULL");
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = AppError::from(BookingError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let err = AppError::from(BookingError::Storage("connection reset".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("connection reset"));
        assert!(err.source.is_some());
    }
}
