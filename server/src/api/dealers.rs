//! Dealer endpoints.
//!
//! - POST /api/dealers - Create a dealer (admin)
//! - GET /api/dealers - List dealers

use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use demoride_core::{Dealer, NewDealer};
use demoride_web::{ApiJson, AppError};

/// Create a dealer.
pub async fn create_dealer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(dealer): ApiJson<NewDealer>,
) -> Result<(StatusCode, Json<Dealer>), AppError> {
    dealer.validate()?;
    let dealer = state.catalog.create_dealer(dealer).await?;
    tracing::info!(dealer_id = %dealer.id, admin = %admin.user_id, "Dealer created");
    Ok((StatusCode::CREATED, Json(dealer)))
}

/// All dealers, by name.
pub async fn list_dealers(State(state): State<AppState>) -> Result<Json<Vec<Dealer>>, AppError> {
    Ok(Json(state.catalog.list_dealers().await?))
}
