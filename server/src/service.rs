//! Booking orchestration above the stores.
//!
//! The store owns the transaction; the service adds what happens around it:
//! metrics for every outcome and rider notifications delivered after commit.
//! Notification failures are logged and counted, never returned.

use crate::metrics;
use demoride_core::lifecycle::BookingAction;
use demoride_core::notification::{BookingDetails, Notification, Notifier};
use demoride_core::store::{Applied, BookingStore, CatalogStore};
use demoride_core::{
    Booking, BookingError, BookingId, MotorcycleId, ReservationRequest, Result, SessionId, UserId,
};
use std::sync::Arc;
use tracing::Instrument;

/// Reserve and transition bookings, then tell the rider.
#[derive(Clone)]
pub struct BookingService {
    catalog: Arc<dyn CatalogStore>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    /// Create a service over the given stores and notifier.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            notifier,
        }
    }

    /// Reserve `motorcycle_id` at `session_id` for `user_id`.
    ///
    /// # Errors
    ///
    /// Whatever [`BookingStore::reserve`] refuses with.
    pub async fn reserve(
        &self,
        user_id: UserId,
        session_id: SessionId,
        motorcycle_id: MotorcycleId,
    ) -> Result<Booking> {
        let request = ReservationRequest {
            booking_id: BookingId::new(),
            user_id,
            session_id,
            motorcycle_id,
        };

        match self.bookings.reserve(request).await {
            Ok(booking) => {
                tracing::info!(
                    booking_id = %booking.id,
                    session_id = %session_id,
                    user_id = %user_id,
                    "Seat reserved"
                );
                metrics::record_booking_reserved();
                self.notify(vec![Notification::BookingReserved {
                    booking_id: booking.id,
                }]);
                Ok(booking)
            },
            Err(error) => {
                if error.is_rejection() || matches!(error, BookingError::Validation(_)) {
                    tracing::info!(
                        session_id = %session_id,
                        user_id = %user_id,
                        code = error.code(),
                        "Reservation refused"
                    );
                    metrics::record_booking_rejected(error.code());
                }
                Err(error)
            },
        }
    }

    /// Apply a status change.
    ///
    /// # Errors
    ///
    /// Whatever [`BookingStore::apply`] refuses with.
    pub async fn transition(&self, booking_id: BookingId, action: BookingAction) -> Result<Applied> {
        let target = action.target();
        let applied = self.bookings.apply(booking_id, action).await?;

        tracing::info!(
            booking_id = %booking_id,
            status = %target,
            booked_slots = applied.session.booked_slots,
            "Booking status changed"
        );
        metrics::record_status_change(target.as_str());
        self.notify(applied.notifications.clone());
        Ok(applied)
    }

    /// Deliver notifications in the background.
    pub fn notify(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }

        let service = self.clone();
        let span = tracing::debug_span!("notify", count = notifications.len());
        tokio::spawn(
            async move {
                for notification in notifications {
                    service.deliver(&notification).await;
                }
            }
            .instrument(span),
        );
    }

    /// Render and send one notification, logging any failure.
    pub async fn deliver(&self, notification: &Notification) {
        let booking_id = notification.booking_id();
        let result = match self.details(booking_id).await {
            Ok(details) => self
                .notifier
                .send(notification.render(&details))
                .await
                .map_err(|e| e.to_string()),
            Err(error) => Err(error.to_string()),
        };

        match result {
            Ok(()) => {
                tracing::debug!(booking_id = %booking_id, kind = notification.kind(), "Notification sent");
                metrics::record_notification(notification.kind(), true);
            },
            Err(error) => {
                tracing::warn!(
                    booking_id = %booking_id,
                    kind = notification.kind(),
                    error = %error,
                    "Notification delivery failed"
                );
                metrics::record_notification(notification.kind(), false);
            },
        }
    }

    /// Everything an email about `booking_id` mentions.
    ///
    /// # Errors
    ///
    /// `NotFound` if any referenced record is gone, `Storage` on backend failure.
    pub async fn details(&self, booking_id: BookingId) -> Result<BookingDetails> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking", booking_id))?;
        let rider = self
            .catalog
            .get_user(booking.user_id)
            .await?
            .ok_or_else(|| BookingError::not_found("User", booking.user_id))?;
        let session = self
            .catalog
            .get_session(booking.session_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Session", booking.session_id))?;
        let event = self
            .catalog
            .get_event(booking.event_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Event", booking.event_id))?;
        let motorcycle = self
            .catalog
            .get_motorcycle(booking.motorcycle_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Motorcycle", booking.motorcycle_id))?;

        Ok(BookingDetails {
            rider_name: rider.full_name(),
            rider_email: rider.email,
            event_name: event.name,
            event_location: event.location,
            session_starts_at: session.starts_at,
            motorcycle_model: motorcycle.model,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use demoride_core::environment::Clock;
    use demoride_testing::fixtures::{Scenario, seed_riders};
    use demoride_testing::{FailingNotifier, InMemoryStore, RecordingNotifier, test_clock};

    fn setup(notifier: Arc<dyn Notifier>) -> (BookingService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new(Arc::new(test_clock())));
        let service = BookingService::new(store.clone(), store.clone(), notifier);
        (service, store)
    }

    #[tokio::test]
    async fn details_resolve_every_reference() {
        let (service, store) = setup(Arc::new(RecordingNotifier::new()));
        let scenario = Scenario::seed(store.as_ref(), test_clock().now(), 2, 1)
            .await
            .unwrap();
        let riders = seed_riders(store.as_ref(), 1).await.unwrap();

        let booking = service
            .reserve(riders[0].id, scenario.session.id, scenario.fleet[0].id)
            .await
            .unwrap();
        let details = service.details(booking.id).await.unwrap();

        assert_eq!(details.rider_email, "rider0@example.com");
        assert_eq!(details.event_name, scenario.event.name);
        assert_eq!(details.motorcycle_model, scenario.fleet[0].model);
        assert_eq!(details.session_starts_at, scenario.session.starts_at);
    }

    #[tokio::test]
    async fn deliver_sends_rendered_email() {
        let notifier = RecordingNotifier::new();
        let (service, store) = setup(Arc::new(notifier.clone()));
        let scenario = Scenario::seed(store.as_ref(), test_clock().now(), 2, 1)
            .await
            .unwrap();
        let riders = seed_riders(store.as_ref(), 1).await.unwrap();
        let booking = service
            .reserve(riders[0].id, scenario.session.id, scenario.fleet[0].id)
            .await
            .unwrap();

        service
            .deliver(&Notification::BookingConfirmed {
                booking_id: booking.id,
            })
            .await;

        let sent = notifier.sent();
        assert!(sent.iter().any(|email| email.subject.contains("is confirmed")));
        assert!(sent.iter().all(|email| email.to == "rider0@example.com"));
    }

    #[tokio::test]
    async fn delivery_failure_does_not_fail_the_transition() {
        let (service, store) = setup(Arc::new(FailingNotifier));
        let scenario = Scenario::seed(store.as_ref(), test_clock().now(), 2, 1)
            .await
            .unwrap();
        let riders = seed_riders(store.as_ref(), 1).await.unwrap();
        let booking = service
            .reserve(riders[0].id, scenario.session.id, scenario.fleet[0].id)
            .await
            .unwrap();

        let applied = service
            .transition(booking.id, BookingAction::Cancel { reason: None })
            .await
            .unwrap();

        assert_eq!(applied.session.booked_slots, 0);
    }

    #[tokio::test]
    async fn rejection_is_returned_unchanged() {
        let (service, store) = setup(Arc::new(RecordingNotifier::new()));
        let scenario = Scenario::seed(store.as_ref(), test_clock().now(), 1, 2)
            .await
            .unwrap();
        let riders = seed_riders(store.as_ref(), 2).await.unwrap();
        service
            .reserve(riders[0].id, scenario.session.id, scenario.fleet[0].id)
            .await
            .unwrap();

        let error = service
            .reserve(riders[1].id, scenario.session.id, scenario.fleet[1].id)
            .await
            .unwrap_err();

        assert_eq!(error.code(), "SLOT_FULL");
    }
}
