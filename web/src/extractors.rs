//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation ID (set by the middleware)
//! - `BearerToken`: raw token from `Authorization: Bearer <token>`
//! - `ApiJson`: JSON body whose rejections use the [`AppError`] body shape
//!
//! # Examples
//!
//! ```ignore
//! use demoride_web::extractors::{ApiJson, BearerToken, CorrelationId};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     token: BearerToken,
//!     ApiJson(body): ApiJson<NewEvent>,
//! ) -> Result<Json<Event>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Creating event");
//!     ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use demoride_core::FieldError;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reads the ID the correlation middleware stored in the request extensions;
/// without the middleware, falls back to the `X-Correlation-ID` header or a
/// fresh UUID v4.
///
/// # Example
///
/// ```ignore
/// async fn handler(correlation_id: CorrelationId) -> String {
///     format!("Request ID: {}", correlation_id.0)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is missing or not a bearer credential.
/// Validation of the token itself is up to the caller.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authorization must be a bearer token"))?;

        Ok(Self(token.to_string()))
    }
}

/// JSON request body.
///
/// Like [`axum::Json`], but malformed bodies answer with the common error
/// shape: 422 `VALIDATION_ERROR` when the JSON is well-formed but does not
/// match the expected type, 400 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                Self::validation(vec![FieldError::new("body", e.body_text())])
            },
            other => Self::bad_request(other.body_text()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let stored = CorrelationId(Uuid::new_v4());
        let mut req = Request::builder()
            .header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string())
            .body(())
            .expect("Valid request");
        req.extensions_mut().insert(stored);

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id, stored);
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let req = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_bearer_token_missing_is_unauthorized() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer ")] {
            let mut builder = Request::builder();
            if let Some(value) = header {
                builder = builder.header(AUTHORIZATION, value);
            }
            let (mut parts, ()) = builder.body(()).expect("Valid request").into_parts();

            let rejection = BearerToken::from_request_parts(&mut parts, &()).await;

            assert!(
                matches!(rejection, Err(ref e) if e.status() == StatusCode::UNAUTHORIZED),
                "header {header:?} should be rejected"
            );
        }
    }
}
