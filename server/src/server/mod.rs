//! HTTP server module for the demo-ride platform.
//!
//! - Application state management
//! - Health, readiness and metrics endpoints
//! - Router configuration

pub mod health;
pub mod routes;
pub mod state;

pub use health::DatabaseReadiness;
pub use routes::build_router;
pub use state::AppState;
