//! # Demoride Testing
//!
//! Testing utilities for the demo-ride booking platform.
//!
//! This crate provides:
//! - Mock implementations of environment traits (clock, notifier)
//! - An in-memory store implementing both store traits
//! - Seed data builders
//! - Property-based testing strategies
//! - The Given-When-Then [`ReducerTest`] builder
//!
//! ## Example
//!
//! ```ignore
//! use demoride_testing::{fixtures::Scenario, test_clock, InMemoryStore};
//!
//! #[tokio::test]
//! async fn reserve_one_seat() {
//!     let store = InMemoryStore::new(Arc::new(test_clock()));
//!     let scenario = Scenario::seed(&store, test_clock().now(), 1, 2).await?;
//!     let booking = store.reserve(request).await?;
//!     assert_eq!(booking.status, BookingStatus::Reserved);
//! }
//! ```

use chrono::{DateTime, Utc};
use demoride_core::environment::Clock;

pub mod fixtures;
pub mod in_memory_store;
pub mod reducer_test;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use demoride_core::notification::{Notifier, NotifyError, OutgoingEmail};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use demoride_testing::mocks::FixedClock;
    /// use demoride_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Notifier that keeps every email it is asked to send.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    }

    impl RecordingNotifier {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Emails sent so far, in order.
        #[must_use]
        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(
            &self,
            email: OutgoingEmail,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .map_err(|e| NotifyError(e.to_string()))?
                    .push(email);
                Ok(())
            })
        }
    }

    /// Notifier whose deliveries always fail.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(
            &self,
            email: OutgoingEmail,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            Box::pin(async move { Err(NotifyError(format!("mailbox {} unreachable", email.to))) })
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use demoride_core::lifecycle::BookingAction;
    use demoride_core::BookingStatus;
    use proptest::prelude::*;

    /// Any booking status.
    pub fn any_status() -> impl Strategy<Value = BookingStatus> {
        prop_oneof![
            Just(BookingStatus::Reserved),
            Just(BookingStatus::Confirmed),
            Just(BookingStatus::InProgress),
            Just(BookingStatus::Completed),
            Just(BookingStatus::Cancelled),
            Just(BookingStatus::NoShow),
        ]
    }

    /// Any lifecycle action.
    pub fn any_action() -> impl Strategy<Value = BookingAction> {
        prop_oneof![
            Just(BookingAction::Confirm),
            Just(BookingAction::Start),
            Just(BookingAction::Complete),
            proptest::option::of("[a-z ]{0,16}").prop_map(|reason| BookingAction::Cancel { reason }),
            Just(BookingAction::MarkNoShow),
        ]
    }
}

/// Install a test tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use in_memory_store::InMemoryStore;
pub use mocks::{test_clock, FailingNotifier, FixedClock, RecordingNotifier};
pub use reducer_test::{assertions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;
    use demoride_core::notification::{Notifier, OutgoingEmail};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[tokio::test]
    async fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        for to in ["a@example.com", "b@example.com"] {
            let sent = notifier
                .send(OutgoingEmail {
                    to: to.to_string(),
                    subject: "s".to_string(),
                    body: "b".to_string(),
                })
                .await;
            assert!(sent.is_ok());
        }
        let to: Vec<_> = notifier.sent().into_iter().map(|e| e.to).collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn failing_notifier_fails() {
        let result = FailingNotifier
            .send(OutgoingEmail {
                to: "a@example.com".to_string(),
                subject: String::new(),
                body: String::new(),
            })
            .await;
        assert!(result.is_err());
    }
}
