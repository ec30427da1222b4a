//! REST API handlers, mounted under `/api`.

pub mod bookings;
pub mod dealers;
pub mod events;
pub mod exports;
pub mod motorcycles;
pub mod sessions;
