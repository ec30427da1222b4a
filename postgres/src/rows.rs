//! Database rows and their conversion into domain records.
//!
//! Enumerations are stored as their upper-case labels; counters as `INTEGER`.

use chrono::{DateTime, Utc};
use demoride_core::{
    Booking, BookingError, Dealer, Event, Motorcycle, Result, Session, User,
};
use std::str::FromStr;
use uuid::Uuid;

fn parse<T>(label: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    label
        .parse()
        .map_err(|e: T::Err| BookingError::Storage(e.to_string()))
}

fn counter(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| BookingError::Storage(format!("negative {column}: {value}")))
}

/// Bind form of a `u32` counter.
pub(crate) fn to_db_counter(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| BookingError::Storage(format!("counter {value} exceeds INTEGER range")))
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: String,
    license: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = BookingError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id.into(),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role: parse(&row.role)?,
            license: row.license.as_deref().map(parse).transpose()?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DealerRow {
    id: Uuid,
    name: String,
    city: String,
    created_at: DateTime<Utc>,
}

impl From<DealerRow> for Dealer {
    fn from(row: DealerRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            city: row.city,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    name: String,
    location: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    dealer_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            dealer_id: row.dealer_id.map(Into::into),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SessionRow {
    id: Uuid,
    event_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    group_tag: String,
    available_slots: i32,
    booked_slots: i32,
    instructor_id: Option<Uuid>,
}

impl TryFrom<SessionRow> for Session {
    type Error = BookingError;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(Self {
            id: row.id.into(),
            event_id: row.event_id.into(),
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            group_tag: row.group_tag,
            available_slots: counter(row.available_slots, "available_slots")?,
            booked_slots: counter(row.booked_slots, "booked_slots")?,
            instructor_id: row.instructor_id.map(Into::into),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MotorcycleRow {
    id: Uuid,
    model: String,
    license_class: String,
    group_tag: String,
    automatic: bool,
    active: bool,
    dealer_id: Option<Uuid>,
}

impl TryFrom<MotorcycleRow> for Motorcycle {
    type Error = BookingError;

    fn try_from(row: MotorcycleRow) -> Result<Self> {
        Ok(Self {
            id: row.id.into(),
            model: row.model,
            license_class: parse(&row.license_class)?,
            group_tag: row.group_tag,
            automatic: row.automatic,
            active: row.active,
            dealer_id: row.dealer_id.map(Into::into),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
    event_id: Uuid,
    motorcycle_id: Uuid,
    status: String,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            session_id: row.session_id.into(),
            event_id: row.event_id.into(),
            motorcycle_id: row.motorcycle_id.into(),
            status: parse(&row.status)?,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = BookingError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use demoride_core::{BookingStatus, LicenseClass, Role};

    #[test]
    fn labels_parse_into_enums() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "rider@example.com".into(),
            first_name: "Alex".into(),
            last_name: "Martin".into(),
            phone: None,
            role: "INSTRUCTOR".into(),
            license: Some("A2".into()),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let user = User::try_from(row);
        assert!(matches!(
            user,
            Ok(User { role: Role::Instructor, license: Some(LicenseClass::A2), .. })
        ));
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        let now = Utc::now();
        let row = BookingRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            motorcycle_id: Uuid::new_v4(),
            status: "PENDING".into(),
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Booking::try_from(row), Err(BookingError::Storage(_))));

        assert_eq!(parse::<BookingStatus>("NO_SHOW").ok(), Some(BookingStatus::NoShow));
    }

    #[test]
    fn negative_counters_are_rejected() {
        assert!(counter(-1, "booked_slots").is_err());
        assert_eq!(counter(3, "booked_slots").ok(), Some(3));
        assert!(to_db_counter(u32::MAX).is_err());
    }
}
