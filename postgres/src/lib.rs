//! `PostgreSQL` store for the demo-ride booking platform.
//!
//! Implements [`CatalogStore`] and [`BookingStore`] from `demoride-core` with
//! runtime-checked `sqlx` queries:
//!
//! - Embedded migrations ([`PostgresStore::migrate`])
//! - One transaction per mutation
//! - Reservations lock the rider row, then the session row (`FOR UPDATE`),
//!   so concurrent requests for the same seat or the same rider serialize
//! - Status changes lock the booking row, then its session row
//!
//! The `CHECK (booked_slots <= available_slots)` constraint and the partial
//! unique index on `(session_id, motorcycle_id)` back the same rules at the
//! schema level.
//!
//! # Example
//!
//! ```no_run
//! use demoride_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::new("postgres://localhost/demoride").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;

use demoride_core::capacity::{released, SessionLedger};
use demoride_core::effect::Effect;
use demoride_core::environment::{Clock, SystemClock};
use demoride_core::lifecycle::{
    BookingAction, BookingLifecycle, LifecycleEnvironment, LifecycleState,
};
use demoride_core::reducer::Reducer;
use demoride_core::store::{Applied, BookingStore, CatalogStore, StoreFuture};
use demoride_core::validation::ensure_instructor;
use demoride_core::{
    Booking, BookingError, BookingId, Dealer, Event, EventId, Motorcycle,
    MotorcycleId, NewDealer, NewEvent, NewMotorcycle, NewSession, NewUser, ReservationRequest,
    Result, Session, SessionId, User, UserId,
};
use rows::{
    convert_all, to_db_counter, BookingRow, DealerRow, EventRow, MotorcycleRow, SessionRow,
    UserRow,
};
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, phone, role, license, password_hash, created_at";
const SESSION_COLUMNS: &str =
    "id, event_id, starts_at, ends_at, group_tag, available_slots, booked_slots, instructor_id";
const MOTORCYCLE_COLUMNS: &str = "id, model, license_class, group_tag, automatic, active, dealer_id";
const BOOKING_COLUMNS: &str = "id, user_id, session_id, event_id, motorcycle_id, status, \
     cancellation_reason, created_at, updated_at";

fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> BookingError {
    move |e| BookingError::Storage(format!("{context}: {e}"))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Name of the constraint a database error reports, if any.
fn violated_constraint(error: &sqlx::Error) -> Option<&str> {
    match error {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}

const SESSION_INSTRUCTOR_FK: &str = "sessions_instructor_id_fkey";

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresStore {
    /// Connect to `database_url` with default pool settings.
    ///
    /// # Errors
    ///
    /// `Storage` if the connection cannot be established.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(storage("Failed to connect"))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool, using the system clock.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock (tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// `Storage` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Round-trip to the database (readiness probe).
    ///
    /// # Errors
    ///
    /// `Storage` if the database does not answer.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage("Ping failed"))?;
        Ok(())
    }

    async fn reserve_in(
        &self,
        conn: &mut PgConnection,
        request: ReservationRequest,
    ) -> Result<Booking> {
        let rider: User = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(*request.user_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("Failed to lock rider"))?
        .ok_or_else(|| BookingError::not_found("User", request.user_id))?
        .try_into()?;

        let session: Session = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(*request.session_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("Failed to lock session"))?
        .ok_or_else(|| BookingError::not_found("Session", request.session_id))?
        .try_into()?;

        let motorcycle: Motorcycle = sqlx::query_as::<_, MotorcycleRow>(&format!(
            "SELECT {MOTORCYCLE_COLUMNS} FROM motorcycles WHERE id = $1"
        ))
        .bind(*request.motorcycle_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("Failed to load motorcycle"))?
        .ok_or_else(|| BookingError::not_found("Motorcycle", request.motorcycle_id))?
        .try_into()?;

        let taken: Vec<Uuid> = sqlx::query_scalar(
            "SELECT motorcycle_id FROM bookings WHERE session_id = $1 AND status <> 'CANCELLED'",
        )
        .bind(*session.id.as_uuid())
        .fetch_all(&mut *conn)
        .await
        .map_err(storage("Failed to load taken motorcycles"))?;

        let rider_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE user_id = $1 AND event_id = $2 AND status <> 'CANCELLED'",
        )
        .bind(*rider.id.as_uuid())
        .bind(*session.event_id.as_uuid())
        .fetch_one(&mut *conn)
        .await
        .map_err(storage("Failed to count rider bookings"))?;

        let mut ledger = SessionLedger::new(session);
        ledger.taken_motorcycles = taken
            .into_iter()
            .map(MotorcycleId::from_uuid)
            .collect::<HashSet<_>>();
        ledger.rider_event_bookings = u32::try_from(rider_count).unwrap_or(u32::MAX);

        let booking = ledger.admit(&request, &rider, &motorcycle, self.clock.now())?;

        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(*booking.id.as_uuid())
        .bind(*booking.user_id.as_uuid())
        .bind(*booking.session_id.as_uuid())
        .bind(*booking.event_id.as_uuid())
        .bind(*booking.motorcycle_id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::MotorcycleUnavailable {
                    motorcycle_id: booking.motorcycle_id,
                    session_id: booking.session_id,
                }
            } else {
                storage("Failed to insert booking")(e)
            }
        })?;

        sqlx::query("UPDATE sessions SET booked_slots = $2 WHERE id = $1")
            .bind(*ledger.session.id.as_uuid())
            .bind(to_db_counter(ledger.session.booked_slots)?)
            .execute(&mut *conn)
            .await
            .map_err(storage("Failed to update session"))?;

        Ok(booking)
    }

    async fn apply_in(
        &self,
        conn: &mut PgConnection,
        booking_id: BookingId,
        action: BookingAction,
    ) -> Result<Applied> {
        let booking: Booking = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(*booking_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("Failed to lock booking"))?
        .ok_or_else(|| BookingError::not_found("Booking", booking_id))?
        .try_into()?;

        let mut session: Session = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(*booking.session_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("Failed to lock session"))?
        .ok_or_else(|| BookingError::not_found("Session", booking.session_id))?
        .try_into()?;

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
                    sqlx::query("UPDATE sessions SET booked_slots = $2 WHERE id = $1")
                        .bind(*session.id.as_uuid())
                        .bind(to_db_counter(session.booked_slots)?)
                        .execute(&mut *conn)
                        .await
                        .map_err(storage("Failed to release seat"))?;
                }
            }
        }

        let booking = state.booking;
        sqlx::query(
            "UPDATE bookings SET status = $2, cancellation_reason = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(*booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(storage("Failed to update booking"))?;

        Ok(Applied {
            booking,
            session,
            notifications: Effect::notifications(&effects),
        })
    }

    async fn fetch_bookings(&self, filter: &str, id: Uuid, order: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {filter} = $1 ORDER BY {order}"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list bookings"))?;
        convert_all(rows)
    }
}

impl CatalogStore for PostgresStore {
    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(user.email.to_lowercase())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.phone.as_deref())
            .bind(user.role.as_str())
            .bind(user.license.map(|l| l.as_str()))
            .bind(&user.password_hash)
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BookingError::Conflict(format!("email {} is already registered", user.email))
                } else {
                    storage("Failed to create user")(e)
                }
            })?;
            row.try_into()
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage("Failed to get user"))?
                .map(User::try_from)
                .transpose()
        })
    }

    fn find_user_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to find user"))?
            .map(User::try_from)
            .transpose()
        })
    }

    fn create_dealer(&self, dealer: NewDealer) -> StoreFuture<'_, Dealer> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, DealerRow>(
                "INSERT INTO dealers (id, name, city, created_at) VALUES ($1, $2, $3, $4) \
                 RETURNING id, name, city, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(&dealer.name)
            .bind(&dealer.city)
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(storage("Failed to create dealer"))?;
            Ok(row.into())
        })
    }

    fn list_dealers(&self) -> StoreFuture<'_, Vec<Dealer>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, DealerRow>(
                "SELECT id, name, city, created_at FROM dealers ORDER BY name",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(storage("Failed to list dealers"))?;
            Ok(rows.into_iter().map(Dealer::from).collect())
        })
    }

    fn create_event(&self, event: NewEvent) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, EventRow>(
                "INSERT INTO events (id, name, location, starts_at, ends_at, dealer_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING id, name, location, starts_at, ends_at, dealer_id, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(&event.name)
            .bind(&event.location)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(event.dealer_id.map(|d| *d.as_uuid()))
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match event.dealer_id {
                Some(dealer_id) if is_foreign_key_violation(&e) => {
                    BookingError::not_found("Dealer", dealer_id)
                },
                _ => storage("Failed to create event")(e),
            })?;
            Ok(row.into())
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, EventRow>(
                "SELECT id, name, location, starts_at, ends_at, dealer_id, created_at \
                 FROM events WHERE id = $1",
            )
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to get event"))?;
            Ok(row.map(Event::from))
        })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, EventRow>(
                "SELECT id, name, location, starts_at, ends_at, dealer_id, created_at \
                 FROM events ORDER BY starts_at",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(storage("Failed to list events"))?;
            Ok(rows.into_iter().map(Event::from).collect())
        })
    }

    fn create_session(&self, session: NewSession) -> StoreFuture<'_, Session> {
        Box::pin(async move {
            if let Some(instructor_id) = session.instructor_id {
                let instructor = self.get_user(instructor_id).await?;
                ensure_instructor(instructor_id, instructor.as_ref())?;
            }
            let row = sqlx::query_as::<_, SessionRow>(&format!(
                "INSERT INTO sessions ({SESSION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, 0, $7) \
                 RETURNING {SESSION_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(*session.event_id.as_uuid())
            .bind(session.starts_at)
            .bind(session.ends_at)
            .bind(&session.group_tag)
            .bind(to_db_counter(session.available_slots)?)
            .bind(session.instructor_id.map(|u| *u.as_uuid()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    match (violated_constraint(&e), session.instructor_id) {
                        (Some(SESSION_INSTRUCTOR_FK), Some(instructor_id)) => {
                            BookingError::not_found("User", instructor_id)
                        },
                        _ => BookingError::not_found("Event", session.event_id),
                    }
                } else {
                    storage("Failed to create session")(e)
                }
            })?;
            row.try_into()
        })
    }

    fn get_session(&self, id: SessionId) -> StoreFuture<'_, Option<Session>> {
        Box::pin(async move {
            sqlx::query_as::<_, SessionRow>(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
            ))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to get session"))?
            .map(Session::try_from)
            .transpose()
        })
    }

    fn list_sessions(&self, event_id: EventId) -> StoreFuture<'_, Vec<Session>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, SessionRow>(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE event_id = $1 ORDER BY starts_at"
            ))
            .bind(*event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage("Failed to list sessions"))?;
            convert_all(rows)
        })
    }

    fn create_motorcycle(&self, motorcycle: NewMotorcycle) -> StoreFuture<'_, Motorcycle> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, MotorcycleRow>(&format!(
                "INSERT INTO motorcycles ({MOTORCYCLE_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, true, $6) RETURNING {MOTORCYCLE_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&motorcycle.model)
            .bind(motorcycle.license_class.as_str())
            .bind(&motorcycle.group_tag)
            .bind(motorcycle.automatic)
            .bind(motorcycle.dealer_id.map(|d| *d.as_uuid()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match motorcycle.dealer_id {
                Some(dealer_id) if is_foreign_key_violation(&e) => {
                    BookingError::not_found("Dealer", dealer_id)
                },
                _ => storage("Failed to create motorcycle")(e),
            })?;
            row.try_into()
        })
    }

    fn get_motorcycle(&self, id: MotorcycleId) -> StoreFuture<'_, Option<Motorcycle>> {
        Box::pin(async move {
            sqlx::query_as::<_, MotorcycleRow>(&format!(
                "SELECT {MOTORCYCLE_COLUMNS} FROM motorcycles WHERE id = $1"
            ))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to get motorcycle"))?
            .map(Motorcycle::try_from)
            .transpose()
        })
    }

    fn list_motorcycles(&self) -> StoreFuture<'_, Vec<Motorcycle>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, MotorcycleRow>(&format!(
                "SELECT {MOTORCYCLE_COLUMNS} FROM motorcycles ORDER BY model"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(storage("Failed to list motorcycles"))?;
            convert_all(rows)
        })
    }
}

impl BookingStore for PostgresStore {
    fn reserve(&self, request: ReservationRequest) -> StoreFuture<'_, Booking> {
        Box::pin(async move {
            let started = Instant::now();
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(storage("Failed to start transaction"))?;

            match self.reserve_in(&mut *tx, request).await {
                Ok(booking) => {
                    tx.commit()
                        .await
                        .map_err(storage("Failed to commit reservation"))?;
                    metrics::histogram!("demoride_store_reserve_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::debug!(
                        booking_id = %booking.id,
                        session_id = %booking.session_id,
                        "Reservation committed"
                    );
                    Ok(booking)
                },
                Err(error) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(error = %rollback, "Rollback failed");
                    }
                    Err(error)
                },
            }
        })
    }

    fn apply(&self, booking_id: BookingId, action: BookingAction) -> StoreFuture<'_, Applied> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(storage("Failed to start transaction"))?;

            match self.apply_in(&mut *tx, booking_id, action).await {
                Ok(applied) => {
                    tx.commit()
                        .await
                        .map_err(storage("Failed to commit status change"))?;
                    Ok(applied)
                },
                Err(error) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(error = %rollback, "Rollback failed");
                    }
                    Err(error)
                },
            }
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            sqlx::query_as::<_, BookingRow>(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
            ))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to get booking"))?
            .map(Booking::try_from)
            .transpose()
        })
    }

    fn list_bookings_for_session(&self, session_id: SessionId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            self.fetch_bookings("session_id", *session_id.as_uuid(), "created_at")
                .await
        })
    }

    fn list_bookings_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            self.fetch_bookings("user_id", *user_id.as_uuid(), "created_at DESC")
                .await
        })
    }

    fn list_bookings_for_event(&self, event_id: EventId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            self.fetch_bookings("event_id", *event_id.as_uuid(), "created_at")
                .await
        })
    }
}
