//! # Demoride Server
//!
//! HTTP API for the demo-ride booking platform: accounts, catalog, bookings
//! and staff exports over the stores defined in `demoride-core`.
//!
//! ## Modules
//!
//! - [`config`]: environment configuration
//! - [`auth`]: JWT access tokens, password hashing, role extractors
//! - [`api`]: REST handlers
//! - [`service`]: reservation and lifecycle orchestration
//! - [`email`]: SMTP and console notifiers
//! - [`metrics`]: business metrics
//! - [`server`]: state, router, health

pub mod api;
pub mod auth;
pub mod config;
pub mod email;
pub mod metrics;
pub mod server;
pub mod service;

pub use config::Config;
pub use server::{build_router, AppState};
pub use service::BookingService;
