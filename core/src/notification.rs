//! Rider notifications.
//!
//! A [`Notification`] says what happened to a booking. The server resolves
//! the booking's details, renders a plain-text [`OutgoingEmail`] and hands it
//! to a [`Notifier`] after the transaction has committed.

use crate::types::BookingId;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// What happened to a booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A seat was reserved
    BookingReserved {
        /// Booking concerned
        booking_id: BookingId,
    },
    /// The booking was confirmed
    BookingConfirmed {
        /// Booking concerned
        booking_id: BookingId,
    },
    /// The booking was cancelled
    BookingCancelled {
        /// Booking concerned
        booking_id: BookingId,
        /// Reason given, if any
        reason: Option<String>,
    },
}

impl Notification {
    /// Booking this notification is about.
    #[must_use]
    pub const fn booking_id(&self) -> BookingId {
        match self {
            Self::BookingReserved { booking_id }
            | Self::BookingConfirmed { booking_id }
            | Self::BookingCancelled { booking_id, .. } => *booking_id,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BookingReserved { .. } => "reserved",
            Self::BookingConfirmed { .. } => "confirmed",
            Self::BookingCancelled { .. } => "cancelled",
        }
    }

    /// Render the email sent to the rider.
    #[must_use]
    pub fn render(&self, details: &BookingDetails) -> OutgoingEmail {
        let when = details.session_starts_at.format("%A %d %B %Y at %H:%M UTC");
        let (subject, lead) = match self {
            Self::BookingReserved { .. } => (
                format!("Your demo ride at {} is reserved", details.event_name),
                format!(
                    "your seat on the {} is reserved for {when}.",
                    details.motorcycle_model
                ),
            ),
            Self::BookingConfirmed { .. } => (
                format!("Your demo ride at {} is confirmed", details.event_name),
                format!(
                    "your ride on the {} on {when} is confirmed. See you there!",
                    details.motorcycle_model
                ),
            ),
            Self::BookingCancelled { reason, .. } => (
                format!("Your demo ride at {} was cancelled", details.event_name),
                match reason {
                    Some(reason) => format!(
                        "your ride on the {} on {when} was cancelled: {reason}.",
                        details.motorcycle_model
                    ),
                    None => format!(
                        "your ride on the {} on {when} was cancelled.",
                        details.motorcycle_model
                    ),
                },
            ),
        };

        let body = format!(
            "Hello {},\n\n{}\n\nEvent: {}\nLocation: {}\nBooking reference: {}\n",
            details.rider_name,
            capitalize(&lead),
            details.event_name,
            details.event_location,
            self.booking_id(),
        );

        OutgoingEmail {
            to: details.rider_email.clone(),
            subject,
            body,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Everything the rendered email mentions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDetails {
    /// Rider display name
    pub rider_name: String,
    /// Rider email
    pub rider_email: String,
    /// Event name
    pub event_name: String,
    /// Event venue
    pub event_location: String,
    /// Session start
    pub session_starts_at: DateTime<Utc>,
    /// Reserved model
    pub motorcycle_model: String,
}

/// A plain-text email ready to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Delivery failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Email delivery abstraction (SMTP, console, recording).
///
/// Uses boxed futures so it can live behind `Arc<dyn Notifier>`.
pub trait Notifier: Send + Sync {
    /// Deliver one email.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the message cannot be built or delivered.
    fn send(
        &self,
        email: OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}
