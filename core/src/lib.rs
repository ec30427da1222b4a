//! # Demoride Core
//!
//! Domain types, booking rules and store traits for the demo-ride booking
//! platform.
//!
//! Administrators create events and time-slotted sessions; riders reserve a
//! specific motorcycle at a specific session. The one rule with teeth is the
//! capacity guard: the number of non-cancelled bookings of a session never
//! exceeds its `available_slots`, even under concurrent requests.
//!
//! ## Core Concepts
//!
//! - **Ledger**: [`capacity::SessionLedger`], the snapshot a store loads under
//!   the session lock and admits a reservation against
//! - **Reducer**: pure `(Booking, Action, Environment) → Effects` for status
//!   transitions ([`lifecycle::BookingLifecycle`])
//! - **Effect**: side effect descriptions (release a seat, notify the rider),
//!   executed by the store and the server
//! - **Store traits**: [`store::CatalogStore`] and [`store::BookingStore`],
//!   implemented by `demoride-postgres` and `demoride-testing`
//!
//! ## Example
//!
//! ```ignore
//! use demoride_core::capacity::SessionLedger;
//!
//! let mut ledger = SessionLedger::new(session);
//! ledger.taken_motorcycles = taken;
//! ledger.rider_event_bookings = rider_count;
//! let booking = ledger.admit(&request, &rider, &motorcycle, clock.now())?;
//! // persist `booking` and `ledger.session.booked_slots`, then commit
//! ```

pub mod capacity;
pub mod error;
pub mod lifecycle;
pub mod notification;
pub mod store;
pub mod types;
pub mod validation;

pub use chrono::{DateTime, Utc};
pub use error::{BookingError, FieldError, Result};
pub use types::*;

/// Reducer module - the trait for pure business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold no I/O; the caller executes the returned effects.
pub mod reducer {
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for BookingLifecycle {
    ///     type State = LifecycleState;
    ///     type Action = BookingAction;
    ///     type Environment = LifecycleEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut LifecycleState,
    ///         action: BookingAction,
    ///         env: &LifecycleEnvironment,
    ///     ) -> Vec<Effect> {
    ///         match action {
    ///             BookingAction::Cancel { .. } => vec![Effect::ReleaseSlot { .. }],
    ///             _ => vec![],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Effect>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned by reducers. The store executes
/// [`Effect::ReleaseSlot`] inside the transaction that persists the new
/// status; the server delivers [`Effect::Notify`] after commit.
pub mod effect {
    use crate::notification::Notification;
    use crate::types::SessionId;

    /// Effect type - describes a side effect to be executed
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect {
        /// No-op effect
        None,

        /// Give a seat back to the session (saturating at zero)
        ReleaseSlot {
            /// Session whose `booked_slots` goes down by one
            session_id: SessionId,
        },

        /// Tell the rider what happened to their booking
        Notify(Notification),

        /// Run effects in parallel
        Parallel(Vec<Effect>),
    }

    impl Effect {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect>) -> Effect {
            Effect::Parallel(effects)
        }

        /// Flatten nested `Parallel` effects and drop `None`.
        #[must_use]
        pub fn flatten(effects: Vec<Effect>) -> Vec<Effect> {
            let mut out = Vec::with_capacity(effects.len());
            for effect in effects {
                match effect {
                    Effect::None => {},
                    Effect::Parallel(inner) => out.extend(Self::flatten(inner)),
                    other => out.push(other),
                }
            }
            out
        }

        /// Notifications carried by a list of effects.
        #[must_use]
        pub fn notifications(effects: &[Effect]) -> Vec<Notification> {
            effects
                .iter()
                .flat_map(|effect| match effect {
                    Effect::Notify(n) => vec![n.clone()],
                    Effect::Parallel(inner) => Self::notifications(inner),
                    _ => vec![],
                })
                .collect()
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock reading the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::notification::Notification;
    use super::types::{BookingId, SessionId};

    #[test]
    fn flatten_drops_none_and_nesting() {
        let session_id = SessionId::new();
        let booking_id = BookingId::new();
        let effects = vec![
            Effect::None,
            Effect::merge(vec![
                Effect::ReleaseSlot { session_id },
                Effect::Notify(Notification::BookingConfirmed { booking_id }),
            ]),
        ];

        let flat = Effect::flatten(effects);

        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0], Effect::ReleaseSlot { session_id });
        assert_eq!(
            Effect::notifications(&flat),
            vec![Notification::BookingConfirmed { booking_id }]
        );
    }
}
