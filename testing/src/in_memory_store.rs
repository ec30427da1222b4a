//! In-memory store for fast, deterministic testing.
//!
//! Implements both [`CatalogStore`] and [`BookingStore`] over hash maps. A
//! single async mutex guards all data, so every mutation is one critical
//! section: the in-memory counterpart of a serialized transaction.

#![allow(clippy::missing_panics_doc)]

use chrono::{DateTime, Utc};
use demoride_core::capacity::{released, SessionLedger};
use demoride_core::effect::Effect;
use demoride_core::environment::Clock;
use demoride_core::lifecycle::{
    BookingAction, BookingLifecycle, LifecycleEnvironment, LifecycleState,
};
use demoride_core::reducer::Reducer;
use demoride_core::store::{Applied, BookingStore, CatalogStore, StoreFuture};
use demoride_core::validation::ensure_instructor;
use demoride_core::{
    Booking, BookingError, BookingId, Dealer, DealerId, Event, EventId, Motorcycle,
    MotorcycleId, NewDealer, NewEvent, NewMotorcycle, NewSession, NewUser, ReservationRequest,
    Session, SessionId, User, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    dealers: HashMap<DealerId, Dealer>,
    events: HashMap<EventId, Event>,
    sessions: HashMap<SessionId, Session>,
    motorcycles: HashMap<MotorcycleId, Motorcycle>,
    bookings: HashMap<BookingId, Booking>,
}

impl Tables {
    fn ledger_for(&self, session: &Session, user_id: UserId) -> SessionLedger {
        let mut ledger = SessionLedger::new(session.clone());
        ledger.taken_motorcycles = self
            .bookings
            .values()
            .filter(|b| b.session_id == session.id && b.status.holds_slot())
            .map(|b| b.motorcycle_id)
            .collect::<HashSet<_>>();
        let rider_count = self
            .bookings
            .values()
            .filter(|b| {
                b.user_id == user_id && b.event_id == session.event_id && b.status.holds_slot()
            })
            .count();
        ledger.rider_event_bookings = u32::try_from(rider_count).unwrap_or(u32::MAX);
        ledger
    }
}

/// In-memory implementation of the store traits.
///
/// # Example
///
/// ```
/// use demoride_testing::{InMemoryStore, test_clock};
/// use demoride_core::store::CatalogStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new(Arc::new(test_clock()));
/// assert!(store.list_events().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Count of non-cancelled bookings referencing a session, recomputed from
    /// the bookings table (independent of `booked_slots`).
    pub async fn holding_bookings(&self, session_id: SessionId) -> u32 {
        let tables = self.tables.lock().await;
        let count = tables
            .bookings
            .values()
            .filter(|b| b.session_id == session_id && b.status.holds_slot())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Overwrite a motorcycle record (e.g. to retire it).
    pub async fn put_motorcycle(&self, motorcycle: Motorcycle) {
        self.tables
            .lock()
            .await
            .motorcycles
            .insert(motorcycle.id, motorcycle);
    }
}

impl CatalogStore for InMemoryStore {
    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            let email = user.email.to_lowercase();
            if tables.users.values().any(|u| u.email == email) {
                return Err(BookingError::Conflict(format!(
                    "email {email} is already registered"
                )));
            }
            let created = User {
                id: UserId::new(),
                email,
                first_name: user.first_name,
                last_name: user.last_name,
                phone: user.phone,
                role: user.role,
                license: user.license,
                password_hash: user.password_hash,
                created_at: self.now(),
            };
            tables.users.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.tables.lock().await.users.get(&id).cloned()) })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            let email = email.to_lowercase();
            Ok(self
                .tables
                .lock()
                .await
                .users
                .values()
                .find(|u| u.email == email)
                .cloned())
        })
    }

    fn create_dealer(&self, dealer: NewDealer) -> StoreFuture<'_, Dealer> {
        Box::pin(async move {
            let created = Dealer {
                id: DealerId::new(),
                name: dealer.name,
                city: dealer.city,
                created_at: self.now(),
            };
            self.tables
                .lock()
                .await
                .dealers
                .insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn list_dealers(&self) -> StoreFuture<'_, Vec<Dealer>> {
        Box::pin(async move {
            let mut dealers: Vec<_> = self.tables.lock().await.dealers.values().cloned().collect();
            dealers.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(dealers)
        })
    }

    fn create_event(&self, event: NewEvent) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            if let Some(dealer_id) = event.dealer_id {
                if !tables.dealers.contains_key(&dealer_id) {
                    return Err(BookingError::not_found("Dealer", dealer_id));
                }
            }
            let created = Event {
                id: EventId::new(),
                name: event.name,
                location: event.location,
                starts_at: event.starts_at,
                ends_at: event.ends_at,
                dealer_id: event.dealer_id,
                created_at: self.now(),
            };
            tables.events.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move { Ok(self.tables.lock().await.events.get(&id).cloned()) })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let mut events: Vec<_> = self.tables.lock().await.events.values().cloned().collect();
            events.sort_by_key(|e| e.starts_at);
            Ok(events)
        })
    }

    fn create_session(&self, session: NewSession) -> StoreFuture<'_, Session> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            if !tables.events.contains_key(&session.event_id) {
                return Err(BookingError::not_found("Event", session.event_id));
            }
            if let Some(instructor_id) = session.instructor_id {
                ensure_instructor(instructor_id, tables.users.get(&instructor_id))?;
            }
            let created = Session {
                id: SessionId::new(),
                event_id: session.event_id,
                starts_at: session.starts_at,
                ends_at: session.ends_at,
                group_tag: session.group_tag,
                available_slots: session.available_slots,
                booked_slots: 0,
                instructor_id: session.instructor_id,
            };
            tables.sessions.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn get_session(&self, id: SessionId) -> StoreFuture<'_, Option<Session>> {
        Box::pin(async move { Ok(self.tables.lock().await.sessions.get(&id).cloned()) })
    }

    fn list_sessions(&self, event_id: EventId) -> StoreFuture<'_, Vec<Session>> {
        Box::pin(async move {
            let mut sessions: Vec<_> = self
                .tables
                .lock()
                .await
                .sessions
                .values()
                .filter(|s| s.event_id == event_id)
                .cloned()
                .collect();
            sessions.sort_by_key(|s| s.starts_at);
            Ok(sessions)
        })
    }

    fn create_motorcycle(&self, motorcycle: NewMotorcycle) -> StoreFuture<'_, Motorcycle> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            if let Some(dealer_id) = motorcycle.dealer_id {
                if !tables.dealers.contains_key(&dealer_id) {
                    return Err(BookingError::not_found("Dealer", dealer_id));
                }
            }
            let created = Motorcycle {
                id: MotorcycleId::new(),
                model: motorcycle.model,
                license_class: motorcycle.license_class,
                group_tag: motorcycle.group_tag,
                automatic: motorcycle.automatic,
                active: true,
                dealer_id: motorcycle.dealer_id,
            };
            tables.motorcycles.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn get_motorcycle(&self, id: MotorcycleId) -> StoreFuture<'_, Option<Motorcycle>> {
        Box::pin(async move { Ok(self.tables.lock().await.motorcycles.get(&id).cloned()) })
    }

    fn list_motorcycles(&self) -> StoreFuture<'_, Vec<Motorcycle>> {
        Box::pin(async move {
            let mut fleet: Vec<_> = self
                .tables
                .lock()
                .await
                .motorcycles
                .values()
                .cloned()
                .collect();
            fleet.sort_by(|a, b| a.model.cmp(&b.model));
            Ok(fleet)
        })
    }
}

impl BookingStore for InMemoryStore {
    fn reserve(&self, request: ReservationRequest) -> StoreFuture<'_, Booking> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;

            let session = tables
                .sessions
                .get(&request.session_id)
                .cloned()
                .ok_or_else(|| BookingError::not_found("Session", request.session_id))?;
            let rider = tables
                .users
                .get(&request.user_id)
                .cloned()
                .ok_or_else(|| BookingError::not_found("User", request.user_id))?;
            let motorcycle = tables
                .motorcycles
                .get(&request.motorcycle_id)
                .cloned()
                .ok_or_else(|| BookingError::not_found("Motorcycle", request.motorcycle_id))?;

            let mut ledger = tables.ledger_for(&session, rider.id);
            let booking = ledger.admit(&request, &rider, &motorcycle, self.now())?;

            tables.sessions.insert(session.id, ledger.session);
            tables.bookings.insert(booking.id, booking.clone());
            Ok(booking)
        })
    }

    fn apply(&self, booking_id: BookingId, action: BookingAction) -> StoreFuture<'_, Applied> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;

            let booking = tables
                .bookings
                .get(&booking_id)
                .cloned()
                .ok_or_else(|| BookingError::not_found("Booking", booking_id))?;
            let mut session = tables
                .sessions
                .get(&booking.session_id)
                .cloned()
                .ok_or_else(|| BookingError::not_found("Session", booking.session_id))?;

            let mut state = LifecycleState::new(booking);
            let env = LifecycleEnvironment::new(Arc::clone(&self.clock));
            let effects = Effect::flatten(BookingLifecycle::new().reduce(&mut state, action, &env));
            if let Some(error) = state.last_error {
                return Err(error);
            }

            for effect in &effects {
                if let Effect::ReleaseSlot { session_id } = effect {
                    if *session_id == session.id {
                        session.booked_slots = released(session.booked_slots);
                    }
                }
            }

            tables.sessions.insert(session.id, session.clone());
            tables.bookings.insert(state.booking.id, state.booking.clone());

            Ok(Applied {
                booking: state.booking,
                session,
                notifications: Effect::notifications(&effects),
            })
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move { Ok(self.tables.lock().await.bookings.get(&id).cloned()) })
    }

    fn list_bookings_for_session(&self, session_id: SessionId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let mut bookings: Vec<_> = self
                .tables
                .lock()
                .await
                .bookings
                .values()
                .filter(|b| b.session_id == session_id)
                .cloned()
                .collect();
            bookings.sort_by_key(|b| b.created_at);
            Ok(bookings)
        })
    }

    fn list_bookings_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let mut bookings: Vec<_> = self
                .tables
                .lock()
                .await
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect();
            bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(bookings)
        })
    }

    fn list_bookings_for_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let mut bookings: Vec<_> = self
                .tables
                .lock()
                .await
                .bookings
                .values()
                .filter(|b| b.event_id == event_id)
                .cloned()
                .collect();
            bookings.sort_by_key(|b| b.created_at);
            Ok(bookings)
        })
    }
}
