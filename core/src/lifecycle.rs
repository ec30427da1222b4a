//! Booking lifecycle reducer.
//!
//! Status transitions of a single booking:
//!
//! ```text
//! Reserved ──► Confirmed ──► InProgress ──► Completed
//!    │  │          │  │
//!    │  └──────────┼──┴──► NoShow
//!    └─────────────┴─────► Cancelled  (seat released)
//! ```
//!
//! A booking is never deleted; cancelling is a status change that also
//! releases the seat it held.

use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::BookingError;
use crate::notification::Notification;
use crate::reducer::Reducer;
use crate::types::{Booking, BookingStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status-changing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BookingAction {
    /// Confirm a reserved seat
    Confirm,
    /// Rider checked in, ride begins
    Start,
    /// Ride finished
    Complete,
    /// Cancel and free the seat
    Cancel {
        /// Optional reason shown to the rider
        reason: Option<String>,
    },
    /// Rider did not come
    MarkNoShow,
}

impl BookingAction {
    /// Status the booking ends up in.
    #[must_use]
    pub const fn target(&self) -> BookingStatus {
        match self {
            Self::Confirm => BookingStatus::Confirmed,
            Self::Start => BookingStatus::InProgress,
            Self::Complete => BookingStatus::Completed,
            Self::Cancel { .. } => BookingStatus::Cancelled,
            Self::MarkNoShow => BookingStatus::NoShow,
        }
    }

    /// Build the action that moves a booking to `status`.
    ///
    /// Returns `None` for `Reserved`, which is only ever set on creation.
    #[must_use]
    pub fn for_status(status: BookingStatus, reason: Option<String>) -> Option<Self> {
        match status {
            BookingStatus::Reserved => None,
            BookingStatus::Confirmed => Some(Self::Confirm),
            BookingStatus::InProgress => Some(Self::Start),
            BookingStatus::Completed => Some(Self::Complete),
            BookingStatus::Cancelled => Some(Self::Cancel { reason }),
            BookingStatus::NoShow => Some(Self::MarkNoShow),
        }
    }
}

/// State of the lifecycle reducer: one booking plus the last rejection.
#[derive(Clone, Debug)]
pub struct LifecycleState {
    /// The booking being transitioned
    pub booking: Booking,
    /// Set when the last action was rejected
    pub last_error: Option<BookingError>,
}

impl LifecycleState {
    /// Wrap a loaded booking.
    #[must_use]
    pub const fn new(booking: Booking) -> Self {
        Self {
            booking,
            last_error: None,
        }
    }
}

/// Dependencies of the lifecycle reducer.
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Clock for `updated_at`
    pub clock: Arc<dyn Clock>,
}

impl LifecycleEnvironment {
    /// Creates a new `LifecycleEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer for booking status transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Creates a new `BookingLifecycle`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for BookingLifecycle {
    type State = LifecycleState;
    type Action = BookingAction;
    type Environment = LifecycleEnvironment;

    fn reduce(
        &self,
        state: &mut LifecycleState,
        action: BookingAction,
        env: &LifecycleEnvironment,
    ) -> Vec<Effect> {
        let from = state.booking.status;
        let to = action.target();

        if !from.can_transition_to(to) {
            state.last_error = Some(BookingError::InvalidTransition { from, to });
            return Vec::new();
        }

        state.last_error = None;
        state.booking.status = to;
        state.booking.updated_at = env.clock.now();
        let booking_id = state.booking.id;

        match action {
            BookingAction::Cancel { reason } => {
                state.booking.cancellation_reason.clone_from(&reason);
                vec![
                    Effect::ReleaseSlot {
                        session_id: state.booking.session_id,
                    },
                    Effect::Notify(Notification::BookingCancelled { booking_id, reason }),
                ]
            },
            BookingAction::Confirm => {
                vec![Effect::Notify(Notification::BookingConfirmed { booking_id })]
            },
            BookingAction::Start | BookingAction::Complete | BookingAction::MarkNoShow => {
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_status_round_trips_targets() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            let action = BookingAction::for_status(status, None);
            assert_eq!(action.map(|a| a.target()), Some(status));
        }
        assert_eq!(BookingAction::for_status(BookingStatus::Reserved, None), None);
    }

    #[test]
    fn action_json_shape() {
        let action: Result<BookingAction, _> =
            serde_json::from_str(r#"{"action":"cancel","reason":"sick"}"#);
        assert!(matches!(
            action,
            Ok(BookingAction::Cancel { reason: Some(ref r) }) if r == "sick"
        ));
    }
}
