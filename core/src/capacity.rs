//! Booking capacity guard.
//!
//! Admission of a new booking into a session. A [`SessionLedger`] is the
//! snapshot a store loads while holding the session exclusively (row lock in
//! `PostgreSQL`, mutex in memory); [`SessionLedger::admit`] decides and
//! applies the reservation to the snapshot, and the store writes the result
//! back in the same unit of work. Nothing is written when `admit` fails.
//!
//! ```text
//! remaining = available_slots - booked_slots
//!
//! if remaining == 0 {
//!     return SlotFull        // one request wins the last seat, the others fail
//! }
//! ```

use crate::error::{BookingError, Result};
use crate::types::{
    Booking, BookingStatus, Motorcycle, MotorcycleId, ReservationRequest, Session, User,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Maximum non-cancelled bookings a rider may hold for one event.
pub const MAX_BOOKINGS_PER_EVENT: u32 = 2;

/// Everything needed to decide a reservation, loaded under the session lock.
#[derive(Clone, Debug)]
pub struct SessionLedger {
    /// The session, including its current `booked_slots`
    pub session: Session,
    /// Motorcycles held by non-cancelled bookings in this session
    pub taken_motorcycles: HashSet<MotorcycleId>,
    /// Non-cancelled bookings the requesting rider holds for the session's event
    pub rider_event_bookings: u32,
}

impl SessionLedger {
    /// Creates a ledger from a loaded session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            taken_motorcycles: HashSet::new(),
            rider_event_bookings: 0,
        }
    }

    /// Seats still open in the session.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.session.remaining_slots()
    }

    /// Check every admission rule without changing anything.
    ///
    /// Rules are evaluated in a fixed order so the reported reason is stable:
    /// motorcycle state and compatibility, license, motorcycle availability,
    /// per-event limit, then capacity.
    ///
    /// # Errors
    ///
    /// Returns the first rule that rejects the reservation.
    pub fn check(&self, rider: &User, motorcycle: &Motorcycle) -> Result<()> {
        if !motorcycle.active {
            return Err(BookingError::invalid(
                "motorcycle_id",
                "motorcycle is not available for demo rides",
            ));
        }

        if motorcycle.group_tag != self.session.group_tag {
            return Err(BookingError::MotorcycleIncompatible {
                motorcycle_group: motorcycle.group_tag.clone(),
                session_group: self.session.group_tag.clone(),
            });
        }

        if let Some(held) = rider.license {
            if !held.permits(motorcycle.license_class) {
                return Err(BookingError::LicenseInsufficient {
                    held,
                    required: motorcycle.license_class,
                });
            }
        }

        if self.taken_motorcycles.contains(&motorcycle.id) {
            return Err(BookingError::MotorcycleUnavailable {
                motorcycle_id: motorcycle.id,
                session_id: self.session.id,
            });
        }

        if self.rider_event_bookings >= MAX_BOOKINGS_PER_EVENT {
            return Err(BookingError::BookingLimitReached {
                event_id: self.session.event_id,
                limit: MAX_BOOKINGS_PER_EVENT,
            });
        }

        if self.session.is_full() {
            return Err(BookingError::SlotFull {
                session_id: self.session.id,
                capacity: self.session.available_slots,
            });
        }

        Ok(())
    }

    /// Admit a reservation: check the rules, then take the seat.
    ///
    /// On success the ledger reflects the new booking (`booked_slots`
    /// incremented, motorcycle taken, rider count incremented) and the new
    /// booking record is returned for the store to persist.
    ///
    /// # Errors
    ///
    /// Returns the rejecting rule; the ledger is left untouched.
    pub fn admit(
        &mut self,
        request: &ReservationRequest,
        rider: &User,
        motorcycle: &Motorcycle,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if request.session_id != self.session.id {
            return Err(BookingError::invalid(
                "session_id",
                "request does not target the loaded session",
            ));
        }
        if request.motorcycle_id != motorcycle.id || request.user_id != rider.id {
            return Err(BookingError::invalid(
                "motorcycle_id",
                "request does not match the loaded records",
            ));
        }

        self.check(rider, motorcycle)?;

        self.session.booked_slots += 1;
        self.taken_motorcycles.insert(motorcycle.id);
        self.rider_event_bookings += 1;

        Ok(Booking {
            id: request.booking_id,
            user_id: rider.id,
            session_id: self.session.id,
            event_id: self.session.event_id,
            motorcycle_id: motorcycle.id,
            status: BookingStatus::Reserved,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Seat count after a cancellation. Saturates at zero.
#[must_use]
pub const fn released(booked_slots: u32) -> u32 {
    booked_slots.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingId, EventId, LicenseClass, Role, SessionId, UserId};

    fn session(capacity: u32, booked: u32) -> Session {
        Session {
            id: SessionId::new(),
            event_id: EventId::new(),
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            group_tag: "roadster".into(),
            available_slots: capacity,
            booked_slots: booked,
            instructor_id: None,
        }
    }

    fn rider(license: Option<LicenseClass>) -> User {
        User {
            id: UserId::new(),
            email: "rider@example.com".into(),
            first_name: "Alex".into(),
            last_name: "Martin".into(),
            phone: None,
            role: Role::Client,
            license,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn bike(class: LicenseClass, group: &str) -> Motorcycle {
        Motorcycle {
            id: MotorcycleId::new(),
            model: "MT-07".into(),
            license_class: class,
            group_tag: group.into(),
            automatic: false,
            active: true,
            dealer_id: None,
        }
    }

    fn request(ledger: &SessionLedger, rider: &User, bike: &Motorcycle) -> ReservationRequest {
        ReservationRequest {
            booking_id: BookingId::new(),
            user_id: rider.id,
            session_id: ledger.session.id,
            motorcycle_id: bike.id,
        }
    }

    #[test]
    fn admits_and_takes_a_seat() {
        let mut ledger = SessionLedger::new(session(2, 0));
        let rider = rider(Some(LicenseClass::A2));
        let bike = bike(LicenseClass::A2, "roadster");
        let req = request(&ledger, &rider, &bike);

        let booking = ledger.admit(&req, &rider, &bike, Utc::now());

        let booking = booking.unwrap_or_else(|e| unreachable!("admission failed: {e}"));
        assert_eq!(booking.status, BookingStatus::Reserved);
        assert_eq!(booking.event_id, ledger.session.event_id);
        assert_eq!(ledger.session.booked_slots, 1);
        assert!(ledger.taken_motorcycles.contains(&bike.id));
        assert_eq!(ledger.rider_event_bookings, 1);
    }

    #[test]
    fn last_seat_goes_once() {
        let mut ledger = SessionLedger::new(session(1, 0));
        let first = rider(None);
        let second = rider(None);
        let bike_a = bike(LicenseClass::A1, "roadster");
        let bike_b = bike(LicenseClass::A1, "roadster");

        let req = request(&ledger, &first, &bike_a);
        assert!(ledger.admit(&req, &first, &bike_a, Utc::now()).is_ok());

        ledger.rider_event_bookings = 0;
        let req = request(&ledger, &second, &bike_b);
        let err = ledger.admit(&req, &second, &bike_b, Utc::now());
        assert!(matches!(err, Err(BookingError::SlotFull { capacity: 1, .. })));
        assert_eq!(ledger.session.booked_slots, 1);
    }

    #[test]
    fn rejects_third_booking_for_event() {
        let mut ledger = SessionLedger::new(session(10, 2));
        ledger.rider_event_bookings = MAX_BOOKINGS_PER_EVENT;
        let rider = rider(None);
        let bike = bike(LicenseClass::A1, "roadster");
        let req = request(&ledger, &rider, &bike);

        let err = ledger.admit(&req, &rider, &bike, Utc::now());

        assert!(matches!(
            err,
            Err(BookingError::BookingLimitReached { limit: 2, .. })
        ));
        assert_eq!(ledger.session.booked_slots, 2);
    }

    #[test]
    fn rejects_motorcycle_taken_in_session() {
        let mut ledger = SessionLedger::new(session(10, 1));
        let rider = rider(None);
        let bike = bike(LicenseClass::A1, "roadster");
        ledger.taken_motorcycles.insert(bike.id);
        let req = request(&ledger, &rider, &bike);

        let err = ledger.admit(&req, &rider, &bike, Utc::now());

        assert!(matches!(
            err,
            Err(BookingError::MotorcycleUnavailable { .. })
        ));
    }

    #[test]
    fn rejects_wrong_group_and_insufficient_license() {
        let ledger = SessionLedger::new(session(10, 0));
        let novice = rider(Some(LicenseClass::A2));

        let wrong_group = bike(LicenseClass::A2, "sport");
        assert!(matches!(
            ledger.check(&novice, &wrong_group),
            Err(BookingError::MotorcycleIncompatible { .. })
        ));

        let big_bike = bike(LicenseClass::A, "roadster");
        assert!(matches!(
            ledger.check(&novice, &big_bike),
            Err(BookingError::LicenseInsufficient {
                held: LicenseClass::A2,
                required: LicenseClass::A
            })
        ));
    }

    #[test]
    fn inactive_motorcycle_is_a_validation_error() {
        let ledger = SessionLedger::new(session(10, 0));
        let mut retired = bike(LicenseClass::A1, "roadster");
        retired.active = false;

        let err = ledger.check(&rider(None), &retired);

        assert!(matches!(err, Err(BookingError::Validation(_))));
    }

    #[test]
    fn release_saturates_at_zero() {
        assert_eq!(released(3), 2);
        assert_eq!(released(0), 0);
    }
}
