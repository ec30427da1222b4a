//! Domain types for the demo-ride booking platform.
//!
//! Identifiers, enumerations and the persisted records: users, dealers,
//! events, sessions, motorcycles and bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user account
    UserId
);
define_id!(
    /// Unique identifier for a dealer
    DealerId
);
define_id!(
    /// Unique identifier for a demo-ride event
    EventId
);
define_id!(
    /// Unique identifier for a session within an event
    SessionId
);
define_id!(
    /// Unique identifier for a motorcycle in a fleet
    MotorcycleId
);
define_id!(
    /// Unique identifier for a booking
    BookingId
);

/// Error returned when a stored enum label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed
    pub kind: &'static str,
    /// The rejected label
    pub value: String,
}

// ============================================================================
// Roles
// ============================================================================

/// Role of a user account. Gates authorization on every endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Member of the public booking rides for themselves
    Client,
    /// Platform administrator
    Admin,
    /// Dealership staff managing a fleet
    Dealer,
    /// Instructor leading sessions on site
    Instructor,
}

impl Role {
    /// Storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Admin => "ADMIN",
            Self::Dealer => "DEALER",
            Self::Instructor => "INSTRUCTOR",
        }
    }

    /// Admin, dealer and instructor accounts.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Dealer | Self::Instructor)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Self::Client),
            "ADMIN" => Ok(Self::Admin),
            "DEALER" => Ok(Self::Dealer),
            "INSTRUCTOR" => Ok(Self::Instructor),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// License classes
// ============================================================================

/// Driving license class, either held by a rider or required by a motorcycle.
///
/// Classes are ordered A1 < A2 < A. A car license (B) allows 125cc machines
/// and therefore ranks with A1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseClass {
    /// Car license with the light motorcycle extension
    B,
    /// Light motorcycles (125cc, 11kW)
    A1,
    /// Mid-size motorcycles (35kW)
    A2,
    /// Unrestricted
    A,
}

impl LicenseClass {
    const fn rank(self) -> u8 {
        match self {
            Self::B | Self::A1 => 1,
            Self::A2 => 2,
            Self::A => 3,
        }
    }

    /// Whether a rider holding `self` may ride a motorcycle requiring `required`.
    #[must_use]
    pub const fn permits(self, required: Self) -> bool {
        self.rank() >= required.rank()
    }

    /// Storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A => "A",
        }
    }
}

impl FromStr for LicenseClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Self::B),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A" => Ok(Self::A),
            _ => Err(UnknownVariant {
                kind: "license class",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LicenseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Booking status
// ============================================================================

/// Lifecycle status of a booking.
///
/// Every status except `Cancelled` counts against the session capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seat held, awaiting confirmation
    Reserved,
    /// Confirmed by staff or by the rider
    Confirmed,
    /// Rider checked in and out on the ride
    InProgress,
    /// Ride finished
    Completed,
    /// Cancelled; the seat went back to the session
    Cancelled,
    /// Rider did not show up
    NoShow,
}

impl BookingStatus {
    /// Storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }

    /// Whether this booking still occupies a seat.
    #[must_use]
    pub const fn holds_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// No further transition is allowed from a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Allowed status transitions.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Reserved,
                Self::Confirmed | Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (
                Self::Confirmed,
                Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (Self::InProgress, Self::Completed)
        )
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(Self::Reserved),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "NO_SHOW" => Ok(Self::NoShow),
            _ => Err(UnknownVariant {
                kind: "booking status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A registered account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID
    pub id: UserId,
    /// Login email, stored lowercase
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Role gating authorization
    pub role: Role,
    /// License held by the rider, if declared
    pub license: Option<LicenseClass>,
    /// Argon2 PHC string; never serialized to clients
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A dealership owning motorcycles and hosting events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealer {
    /// Dealer ID
    pub id: DealerId,
    /// Trading name
    pub name: String,
    /// City
    pub city: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A demo-ride event spanning one or more days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Venue
    pub location: String,
    /// First day
    pub starts_at: DateTime<Utc>,
    /// Last day
    pub ends_at: DateTime<Utc>,
    /// Hosting dealer
    pub dealer_id: Option<DealerId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A bookable time slot within an event, with fixed capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: SessionId,
    /// Owning event
    pub event_id: EventId,
    /// Slot start
    pub starts_at: DateTime<Utc>,
    /// Slot end
    pub ends_at: DateTime<Utc>,
    /// Only motorcycles carrying the same tag can be booked here
    pub group_tag: String,
    /// Capacity
    pub available_slots: u32,
    /// Seats currently held by non-cancelled bookings
    pub booked_slots: u32,
    /// Instructor leading the ride
    pub instructor_id: Option<UserId>,
}

impl Session {
    /// Seats still open.
    #[must_use]
    pub const fn remaining_slots(&self) -> u32 {
        self.available_slots.saturating_sub(self.booked_slots)
    }

    /// No seat left.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.booked_slots >= self.available_slots
    }
}

/// A motorcycle in a demo fleet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motorcycle {
    /// Motorcycle ID
    pub id: MotorcycleId,
    /// Model name, e.g. "MT-07"
    pub model: String,
    /// License required to ride it
    pub license_class: LicenseClass,
    /// Matches the sessions this machine can be booked in
    pub group_tag: String,
    /// Automatic transmission (Y-AMT)
    pub automatic: bool,
    /// Inactive machines cannot be booked
    pub active: bool,
    /// Owning dealer
    pub dealer_id: Option<DealerId>,
}

/// A user's reservation of a motorcycle within a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Rider
    pub user_id: UserId,
    /// Session the seat belongs to
    pub session_id: SessionId,
    /// Event of the session (for the per-event limit)
    pub event_id: EventId,
    /// Reserved motorcycle
    pub motorcycle_id: MotorcycleId,
    /// Current status
    pub status: BookingStatus,
    /// Reason given on cancellation
    pub cancellation_reason: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Creation inputs
// ============================================================================

/// Input for creating a user. The password is hashed by the caller.
#[derive(Clone, Debug)]
pub struct NewUser {
    /// Login email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Role
    pub role: Role,
    /// Held license
    pub license: Option<LicenseClass>,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Input for creating a dealer.
#[derive(Clone, Debug, Deserialize)]
pub struct NewDealer {
    /// Trading name
    pub name: String,
    /// City
    pub city: String,
}

/// Input for creating an event.
#[derive(Clone, Debug, Deserialize)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// Venue
    pub location: String,
    /// First day
    pub starts_at: DateTime<Utc>,
    /// Last day
    pub ends_at: DateTime<Utc>,
    /// Hosting dealer
    pub dealer_id: Option<DealerId>,
}

/// Input for creating a session.
#[derive(Clone, Debug, Deserialize)]
pub struct NewSession {
    /// Owning event
    pub event_id: EventId,
    /// Slot start
    pub starts_at: DateTime<Utc>,
    /// Slot end
    pub ends_at: DateTime<Utc>,
    /// Motorcycle group accepted
    pub group_tag: String,
    /// Capacity
    pub available_slots: u32,
    /// Instructor
    pub instructor_id: Option<UserId>,
}

/// Input for registering a motorcycle.
#[derive(Clone, Debug, Deserialize)]
pub struct NewMotorcycle {
    /// Model name
    pub model: String,
    /// Required license
    pub license_class: LicenseClass,
    /// Session group
    pub group_tag: String,
    /// Y-AMT variant
    #[serde(default)]
    pub automatic: bool,
    /// Owning dealer
    pub dealer_id: Option<DealerId>,
}

/// A request to reserve a motorcycle at a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    /// Booking ID to create (chosen by the caller so retries are traceable)
    pub booking_id: BookingId,
    /// Rider
    pub user_id: UserId,
    /// Target session
    pub session_id: SessionId,
    /// Target motorcycle
    pub motorcycle_id: MotorcycleId,
}
