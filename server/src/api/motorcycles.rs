//! Fleet endpoints.
//!
//! - POST /api/motorcycles - Register a motorcycle (admin, dealer)
//! - GET /api/motorcycles - The whole fleet

use crate::auth::RequireFleetManager;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use demoride_core::{Motorcycle, NewMotorcycle};
use demoride_web::{ApiJson, AppError};

/// Register a motorcycle, active from the start.
pub async fn create_motorcycle(
    RequireFleetManager(manager): RequireFleetManager,
    State(state): State<AppState>,
    ApiJson(motorcycle): ApiJson<NewMotorcycle>,
) -> Result<(StatusCode, Json<Motorcycle>), AppError> {
    motorcycle.validate()?;
    let motorcycle = state.catalog.create_motorcycle(motorcycle).await?;
    tracing::info!(
        motorcycle_id = %motorcycle.id,
        model = %motorcycle.model,
        by = %manager.user_id,
        "Motorcycle registered"
    );
    Ok((StatusCode::CREATED, Json(motorcycle)))
}

/// The whole fleet, by model.
pub async fn list_motorcycles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Motorcycle>>, AppError> {
    Ok(Json(state.catalog.list_motorcycles().await?))
}
