//! Seed data builders for store and API tests.
//!
//! All builders go through [`CatalogStore`] so they work against any backend.

use chrono::{DateTime, Duration, Utc};
use demoride_core::store::CatalogStore;
use demoride_core::{
    Event, LicenseClass, Motorcycle, NewDealer, NewEvent, NewMotorcycle, NewSession, NewUser, Result, Role,
    Session, User,
};

/// Group tag used by default fixtures.
pub const ROADSTER: &str = "roadster";

/// Placeholder hash for fixture accounts that never log in.
pub const FIXTURE_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$fixture$fixture";

/// A rider account with the given email and license.
#[must_use]
pub fn new_rider(email: &str, license: Option<LicenseClass>) -> NewUser {
    NewUser {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "Rider".to_string(),
        phone: None,
        role: Role::Client,
        license,
        password_hash: FIXTURE_PASSWORD_HASH.to_string(),
    }
}

/// A dealer in Marseille.
#[must_use]
pub fn new_dealer(name: &str) -> NewDealer {
    NewDealer {
        name: name.to_string(),
        city: "Marseille".to_string(),
    }
}

/// An event starting at `starts_at` and lasting one day.
#[must_use]
pub fn new_event(name: &str, starts_at: DateTime<Utc>) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        location: "Circuit Paul Ricard".to_string(),
        starts_at,
        ends_at: starts_at + Duration::days(1),
        dealer_id: None,
    }
}

/// A 30-minute session of the given capacity.
#[must_use]
pub fn new_session(event: &Event, offset_minutes: i64, available_slots: u32) -> NewSession {
    let starts_at = event.starts_at + Duration::minutes(offset_minutes);
    NewSession {
        event_id: event.id,
        starts_at,
        ends_at: starts_at + Duration::minutes(30),
        group_tag: ROADSTER.to_string(),
        available_slots,
        instructor_id: None,
    }
}

/// A roadster requiring `license_class`.
#[must_use]
pub fn new_motorcycle(model: &str, license_class: LicenseClass) -> NewMotorcycle {
    NewMotorcycle {
        model: model.to_string(),
        license_class,
        group_tag: ROADSTER.to_string(),
        automatic: false,
        dealer_id: None,
    }
}

/// A seeded event with one session and a fleet.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// The event
    pub event: Event,
    /// Its only session
    pub session: Session,
    /// Motorcycles in the session's group, all `A2`
    pub fleet: Vec<Motorcycle>,
}

impl Scenario {
    /// Seed an event, one session with `slots` seats and `fleet_size` motorcycles.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn seed(
        store: &dyn CatalogStore,
        now: DateTime<Utc>,
        slots: u32,
        fleet_size: usize,
    ) -> Result<Self> {
        let event = store
            .create_event(new_event("Demo Tour", now + Duration::days(7)))
            .await?;
        let session = store.create_session(new_session(&event, 0, slots)).await?;
        let mut fleet = Vec::with_capacity(fleet_size);
        for n in 0..fleet_size {
            fleet.push(
                store
                    .create_motorcycle(new_motorcycle(&format!("MT-07 #{n}"), LicenseClass::A2))
                    .await?,
            );
        }
        Ok(Self {
            event,
            session,
            fleet,
        })
    }

    /// Add another session of `slots` seats to the event.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn add_session(
        &self,
        store: &dyn CatalogStore,
        offset_minutes: i64,
        slots: u32,
    ) -> Result<Session> {
        store
            .create_session(new_session(&self.event, offset_minutes, slots))
            .await
    }
}

/// Create `count` riders holding an `A` license.
///
/// # Errors
///
/// Propagates store failures.
pub async fn seed_riders(store: &dyn CatalogStore, count: usize) -> Result<Vec<User>> {
    let mut riders = Vec::with_capacity(count);
    for n in 0..count {
        riders.push(
            store
                .create_user(new_rider(
                    &format!("rider{n}@example.com"),
                    Some(LicenseClass::A),
                ))
                .await?,
        );
    }
    Ok(riders)
}
