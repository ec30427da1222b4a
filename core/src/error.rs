//! Error taxonomy for booking operations.

use crate::types::{BookingStatus, EventId, LicenseClass, MotorcycleId, SessionId};
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as sent by the client
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    /// Build a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Everything that can go wrong while reading or mutating bookings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Admission rejections
    // ═══════════════════════════════════════════════════════════
    /// Every seat of the session is taken.
    #[error("Session {session_id} is full ({capacity} slots)")]
    SlotFull {
        /// Full session
        session_id: SessionId,
        /// Its capacity
        capacity: u32,
    },

    /// The rider already holds the maximum number of bookings for this event.
    #[error("Booking limit of {limit} per event reached for event {event_id}")]
    BookingLimitReached {
        /// Event concerned
        event_id: EventId,
        /// Limit in force
        limit: u32,
    },

    /// The motorcycle is already reserved by someone else in this session.
    #[error("Motorcycle {motorcycle_id} is already booked in session {session_id}")]
    MotorcycleUnavailable {
        /// Motorcycle requested
        motorcycle_id: MotorcycleId,
        /// Session requested
        session_id: SessionId,
    },

    /// The motorcycle's group does not match the session group.
    #[error("Motorcycle group '{motorcycle_group}' cannot ride in session group '{session_group}'")]
    MotorcycleIncompatible {
        /// Group tag of the motorcycle
        motorcycle_group: String,
        /// Group tag of the session
        session_group: String,
    },

    /// The rider's license does not cover the motorcycle.
    #[error("License {held} does not permit a motorcycle requiring {required}")]
    LicenseInsufficient {
        /// License held by the rider
        held: LicenseClass,
        /// License required by the motorcycle
        required: LicenseClass,
    },

    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════
    /// The requested status change is not allowed.
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Lookup and input
    // ═══════════════════════════════════════════════════════════
    /// A referenced record does not exist.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Kind of record
        resource: &'static str,
        /// Identifier looked up
        id: String,
    },

    /// Input failed validation.
    #[error("Validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// A unique value is already taken (e.g. email).
    #[error("Conflict: {0}")]
    Conflict(String),

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════
    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl BookingError {
    /// Shorthand for [`BookingError::NotFound`].
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for a single-field [`BookingError::Validation`].
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Admission rejections caused by the state of the session, not by bad input.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SlotFull { .. }
                | Self::BookingLimitReached { .. }
                | Self::MotorcycleUnavailable { .. }
                | Self::MotorcycleIncompatible { .. }
                | Self::LicenseInsufficient { .. }
        )
    }

    /// Stable label used in metrics and API error codes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SlotFull { .. } => "SLOT_FULL",
            Self::BookingLimitReached { .. } => "BOOKING_LIMIT_REACHED",
            Self::MotorcycleUnavailable { .. } => "MOTORCYCLE_UNAVAILABLE",
            Self::MotorcycleIncompatible { .. } => "MOTORCYCLE_INCOMPATIBLE",
            Self::LicenseInsufficient { .. } => "LICENSE_INSUFFICIENT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
