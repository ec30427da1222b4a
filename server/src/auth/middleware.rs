//! Authentication extractors.
//!
//! - [`AuthUser`]: any valid access token
//! - [`RequireStaff`]: ADMIN, DEALER or INSTRUCTOR
//! - [`RequireAdmin`]: ADMIN only
//! - [`RequireFleetManager`]: ADMIN or DEALER
//!
//! Missing, malformed or expired tokens answer 401; a valid token with the
//! wrong role answers 403.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn create_event(
//!     RequireAdmin(admin): RequireAdmin,
//!     State(state): State<AppState>,
//!     ApiJson(body): ApiJson<NewEvent>,
//! ) -> Result<Json<Event>, AppError> {
//!     // admin.role is guaranteed to be Role::Admin
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use demoride_core::{Booking, Role, UserId};
use demoride_web::{AppError, BearerToken};

/// Authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Account ID
    pub user_id: UserId,
    /// Role at token issue time
    pub role: Role,
    /// Login email
    pub email: String,
}

impl AuthUser {
    /// Owners see their own bookings; staff see all of them.
    #[must_use]
    pub fn can_access(&self, booking: &Booking) -> bool {
        self.role.is_staff() || booking.user_id == self.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let claims = state.tokens.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        Ok(Self {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}

/// Caller must be staff.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role.is_staff() {
            Ok(Self(user))
        } else {
            Err(AppError::forbidden("Staff access required"))
        }
    }
}

/// Caller must be an administrator.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role == Role::Admin {
            Ok(Self(user))
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }
}

/// Caller manages a fleet: administrator or dealer.
#[derive(Debug, Clone)]
pub struct RequireFleetManager(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireFleetManager {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if matches!(user.role, Role::Admin | Role::Dealer) {
            Ok(Self(user))
        } else {
            Err(AppError::forbidden("Admin or dealer access required"))
        }
    }
}
