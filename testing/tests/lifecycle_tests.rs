//! Booking lifecycle reducer, Given-When-Then style.

#![allow(clippy::unwrap_used)] // Test code

use chrono::Duration;
use demoride_core::effect::Effect;
use demoride_core::environment::Clock;
use demoride_core::lifecycle::{
    BookingAction, BookingLifecycle, LifecycleEnvironment, LifecycleState,
};
use demoride_core::notification::Notification;
use demoride_core::reducer::Reducer;
use demoride_core::{
    Booking, BookingError, BookingId, BookingStatus, EventId, MotorcycleId, SessionId, UserId,
};
use demoride_testing::properties::{any_action, any_status};
use demoride_testing::{assertions, test_clock, FixedClock, ReducerTest};
use proptest::prelude::*;
use std::sync::Arc;

fn booking(status: BookingStatus) -> Booking {
    let created = test_clock().now() - Duration::hours(1);
    Booking {
        id: BookingId::new(),
        user_id: UserId::new(),
        session_id: SessionId::new(),
        event_id: EventId::new(),
        motorcycle_id: MotorcycleId::new(),
        status,
        cancellation_reason: None,
        created_at: created,
        updated_at: created,
    }
}

fn env() -> LifecycleEnvironment {
    LifecycleEnvironment::new(Arc::new(test_clock()))
}

#[test]
fn confirm_notifies_the_rider() {
    let booking = booking(BookingStatus::Reserved);
    let booking_id = booking.id;

    ReducerTest::new(BookingLifecycle::new())
        .with_env(env())
        .given_state(LifecycleState::new(booking))
        .when_action(BookingAction::Confirm)
        .then_state(|state| {
            assert_eq!(state.booking.status, BookingStatus::Confirmed);
            assert_eq!(state.booking.updated_at, test_clock().now());
            assert!(state.last_error.is_none());
        })
        .then_effects(move |effects| {
            assertions::assert_keeps_slot(effects);
            assertions::assert_notifies(
                effects,
                &[Notification::BookingConfirmed { booking_id }],
            );
        })
        .run();
}

#[test]
fn cancel_releases_the_seat_and_records_the_reason() {
    let booking = booking(BookingStatus::Confirmed);
    let session_id = booking.session_id;

    ReducerTest::new(BookingLifecycle::new())
        .with_env(env())
        .given_state(LifecycleState::new(booking))
        .when_action(BookingAction::Cancel {
            reason: Some("flat tyre".to_string()),
        })
        .then_state(|state| {
            assert_eq!(state.booking.status, BookingStatus::Cancelled);
            assert_eq!(
                state.booking.cancellation_reason.as_deref(),
                Some("flat tyre")
            );
        })
        .then_effects(move |effects| {
            assertions::assert_effects_count(effects, 2);
            assert_eq!(effects[0], Effect::ReleaseSlot { session_id });
        })
        .run();
}

#[test]
fn in_progress_cannot_be_cancelled() {
    ReducerTest::new(BookingLifecycle::new())
        .with_env(env())
        .given_state(LifecycleState::new(booking(BookingStatus::InProgress)))
        .when_action(BookingAction::Cancel { reason: None })
        .then_state(|state| {
            assert_eq!(state.booking.status, BookingStatus::InProgress);
            assert_eq!(
                state.last_error,
                Some(BookingError::InvalidTransition {
                    from: BookingStatus::InProgress,
                    to: BookingStatus::Cancelled,
                })
            );
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn no_show_keeps_the_seat_and_stays_quiet() {
    ReducerTest::new(BookingLifecycle::new())
        .with_env(env())
        .given_state(LifecycleState::new(booking(BookingStatus::Reserved)))
        .when_action(BookingAction::MarkNoShow)
        .then_state(|state| assert_eq!(state.booking.status, BookingStatus::NoShow))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn success_clears_a_previous_error() {
    let mut state = LifecycleState::new(booking(BookingStatus::Reserved));
    state.last_error = Some(BookingError::InvalidTransition {
        from: BookingStatus::Reserved,
        to: BookingStatus::Completed,
    });

    ReducerTest::new(BookingLifecycle::new())
        .with_env(env())
        .given_state(state)
        .when_action(BookingAction::Start)
        .then_state(|state| {
            assert_eq!(state.booking.status, BookingStatus::InProgress);
            assert!(state.last_error.is_none());
        })
        .run();
}

proptest! {
    #[test]
    fn reducer_follows_the_transition_table(status in any_status(), action in any_action()) {
        let reducer = BookingLifecycle::new();
        let env = LifecycleEnvironment::new(Arc::new(FixedClock::new(test_clock().now())));
        let original = booking(status);
        let mut state = LifecycleState::new(original.clone());
        let target = action.target();

        let effects = reducer.reduce(&mut state, action, &env);

        if status.can_transition_to(target) {
            prop_assert_eq!(state.booking.status, target);
            prop_assert!(state.last_error.is_none());
            let releases = effects.iter().any(|e| matches!(e, Effect::ReleaseSlot { .. }));
            prop_assert_eq!(releases, target == BookingStatus::Cancelled);
        } else {
            prop_assert_eq!(state.booking, original);
            prop_assert!(state.last_error.is_some());
            prop_assert!(effects.is_empty());
        }
    }

    #[test]
    fn terminal_bookings_never_change(action in any_action()) {
        for status in [BookingStatus::Completed, BookingStatus::Cancelled, BookingStatus::NoShow] {
            let mut state = LifecycleState::new(booking(status));
            let effects = BookingLifecycle::new().reduce(&mut state, action.clone(), &env());
            prop_assert_eq!(state.booking.status, status);
            prop_assert!(effects.is_empty());
        }
    }
}
