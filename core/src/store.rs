//! Store traits for the booking platform.
//!
//! # Implementations
//!
//! - `PostgresStore` (in `demoride-postgres`): production, one transaction per
//!   mutation, the session row lock serializes reservations
//! - `InMemoryStore` (in `demoride-testing`): fast, deterministic tests, one
//!   async mutex serializes every mutation
//!
//! # Dyn Compatibility
//!
//! Both traits return `Pin<Box<dyn Future>>` instead of using `async fn` so
//! the server can hold them as `Arc<dyn CatalogStore>` / `Arc<dyn BookingStore>`.

use crate::error::Result;
use crate::lifecycle::BookingAction;
use crate::notification::Notification;
use crate::types::{
    Booking, BookingId, Dealer, Event, EventId, Motorcycle, MotorcycleId, NewDealer, NewEvent,
    NewMotorcycle, NewSession, NewUser, ReservationRequest, Session, SessionId, User, UserId,
};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Outcome of a successful status change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    /// Booking after the transition
    pub booking: Booking,
    /// Session after the transition (seat released on cancel)
    pub session: Session,
    /// Notifications to deliver once committed
    pub notifications: Vec<Notification>,
}

/// Reference data: accounts, dealers, events, sessions and fleet.
pub trait CatalogStore: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// `Conflict` if the email is already registered, `Storage` on backend failure.
    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User>;

    /// Load an account.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Load an account by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Create a dealer.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn create_dealer(&self, dealer: NewDealer) -> StoreFuture<'_, Dealer>;

    /// All dealers, by name.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_dealers(&self) -> StoreFuture<'_, Vec<Dealer>>;

    /// Create an event.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dealer does not exist, `Storage` on backend failure.
    fn create_event(&self, event: NewEvent) -> StoreFuture<'_, Event>;

    /// Load an event.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>>;

    /// All events, soonest first.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_events(&self) -> StoreFuture<'_, Vec<Event>>;

    /// Create a session with `booked_slots = 0`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist, `Storage` on backend failure.
    fn create_session(&self, session: NewSession) -> StoreFuture<'_, Session>;

    /// Load a session.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn get_session(&self, id: SessionId) -> StoreFuture<'_, Option<Session>>;

    /// Sessions of an event, by start time.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_sessions(&self, event_id: EventId) -> StoreFuture<'_, Vec<Session>>;

    /// Register a motorcycle (active).
    ///
    /// # Errors
    ///
    /// `NotFound` if the dealer does not exist, `Storage` on backend failure.
    fn create_motorcycle(&self, motorcycle: NewMotorcycle) -> StoreFuture<'_, Motorcycle>;

    /// Load a motorcycle.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn get_motorcycle(&self, id: MotorcycleId) -> StoreFuture<'_, Option<Motorcycle>>;

    /// The whole fleet, by model.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_motorcycles(&self) -> StoreFuture<'_, Vec<Motorcycle>>;
}

/// Bookings and the capacity guard.
pub trait BookingStore: Send + Sync {
    /// Reserve a motorcycle at a session.
    ///
    /// Loads a [`crate::capacity::SessionLedger`] while holding the session
    /// exclusively, admits the request, inserts the booking and writes the new
    /// `booked_slots`, all or nothing. Concurrent reservations on one session
    /// are serialized.
    ///
    /// # Errors
    ///
    /// - `NotFound`: session, rider or motorcycle missing
    /// - `SlotFull`, `BookingLimitReached`, `MotorcycleUnavailable`,
    ///   `MotorcycleIncompatible`, `LicenseInsufficient`, `Validation`:
    ///   rejected, nothing written
    /// - `Storage`: backend failure, nothing written
    fn reserve(&self, request: ReservationRequest) -> StoreFuture<'_, Booking>;

    /// Apply a status change through the lifecycle reducer.
    ///
    /// Executes `ReleaseSlot` in the same unit of work as the status write.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` (nothing written) or `Storage`.
    fn apply(&self, booking_id: BookingId, action: BookingAction) -> StoreFuture<'_, Applied>;

    /// Load a booking.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>>;

    /// Bookings of a session (all statuses), oldest first.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_bookings_for_session(&self, session_id: SessionId) -> StoreFuture<'_, Vec<Booking>>;

    /// Bookings of a rider (all statuses), newest first.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_bookings_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Booking>>;

    /// Bookings of an event (all statuses), oldest first.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    fn list_bookings_for_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Booking>>;
}
