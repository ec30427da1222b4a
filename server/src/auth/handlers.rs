//! Account endpoints.
//!
//! - POST /api/auth/register - Create a CLIENT account, returns a token
//! - POST /api/auth/login - Exchange email and password for a token
//! - GET /api/auth/me - The caller's account

use super::middleware::AuthUser;
use super::password::{hash_password_blocking, verify_password_blocking, MIN_PASSWORD_LENGTH};
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use demoride_core::validation::normalize_email;
use demoride_core::{BookingError, FieldError, LicenseClass, NewUser, Role, User};
use demoride_web::{ApiJson, AppError};
use serde::{Deserialize, Serialize};

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain password (hashed before storage)
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Held license
    #[serde(default)]
    pub license: Option<LicenseClass>,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain password
    pub password: String,
}

/// Token plus the account it belongs to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// The account
    pub user: User,
}

impl RegisterRequest {
    fn validate(&self) -> Result<String, AppError> {
        let mut errors = Vec::new();
        let email = match normalize_email(&self.email) {
            Ok(email) => Some(email),
            Err(BookingError::Validation(fields)) => {
                errors.extend(fields);
                None
            },
            Err(other) => return Err(other.into()),
        };
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "must not be empty"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("last_name", "must not be empty"));
        }

        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(AppError::validation(errors)),
        }
    }
}

/// Create a CLIENT account.
///
/// Self-registration never grants staff roles; those are provisioned by an
/// administrator directly in the database.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"email":"sam@example.com","password":"hunter22!","first_name":"Sam","last_name":"Rider","license":"A2"}'
/// ```
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = request.validate()?;
    let password_hash = hash_password_blocking(request.password).await?;

    let user = state
        .catalog
        .create_user(NewUser {
            email,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            phone: request.phone,
            role: Role::Client,
            license: request.license,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            BookingError::Conflict(_) => {
                AppError::conflict("CONFLICT", "An account with this email already exists")
            },
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "Account registered");
    let token = state.tokens.issue(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Exchange credentials for a token.
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::unauthorized("Invalid email or password");

    let Ok(email) = normalize_email(&request.email) else {
        return Err(invalid());
    };
    let Some(user) = state.catalog.find_user_by_email(&email).await? else {
        tracing::debug!("Login for unknown email");
        return Err(invalid());
    };

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(invalid());
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse { token, user }))
}

/// The caller's account.
pub async fn me(user: AuthUser, State(state): State<AppState>) -> Result<Json<User>, AppError> {
    state
        .catalog
        .get_user(user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))
}
