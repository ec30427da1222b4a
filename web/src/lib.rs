//! Axum integration for the demo-ride booking platform.
//!
//! The HTTP shell around the booking core: error mapping, extractors,
//! request tracking middleware and health probes. Route handlers live in
//! `demoride-server`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, JWT
//! │  - Request parsing (ApiJson, Bearer)    │  ← Correlation IDs
//! │  - Error mapping (AppError)             │  ← Logging, metrics
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Capacity guard (SessionLedger)       │  ← Pure admission rules
//! │  - Lifecycle reducer                    │  ← Status transitions
//! │  - Effect descriptions (values)         │  ← Release seat, notify
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use demoride_web::{ApiJson, AppError, WebResult};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create_event(
//!     State(state): State<AppState>,
//!     ApiJson(body): ApiJson<NewEvent>,
//! ) -> WebResult<Json<Event>> {
//!     body.validate()?;
//!     Ok(Json(state.catalog.create_event(body).await?))
//! }
//!
//! let app = Router::new()
//!     .route("/api/events", post(create_event))
//!     .layer(request_tracking_layer())
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, BearerToken, CorrelationId};
pub use handlers::health::{health_check, readiness, ReadinessCheck};
pub use middleware::{request_tracking_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
