//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A dependency that must answer before the service takes traffic.
pub trait ReadinessCheck: Send + Sync {
    /// Name reported in the readiness body.
    fn name(&self) -> &'static str;

    /// Probe the dependency.
    ///
    /// # Errors
    ///
    /// A short description of why the dependency is not ready.
    fn check(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
}

/// Body of `GET /ready`.
#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// Dependency probed
    pub dependency: &'static str,
    /// Failure reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness endpoint: 200 when the dependency answers, 503 otherwise.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness(
    State(check): State<Arc<dyn ReadinessCheck>>,
) -> (StatusCode, Json<ReadinessReport>) {
    match check.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                status: "ready",
                dependency: check.name(),
                error: None,
            }),
        ),
        Err(error) => {
            tracing::warn!(dependency = check.name(), error = %error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    status: "unavailable",
                    dependency: check.name(),
                    error: Some(error),
                }),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<(), String>);

    impl ReadinessCheck for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn check(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reports_failure() {
        let check: Arc<dyn ReadinessCheck> = Arc::new(Fixed(Err("db down".into())));
        let (status, Json(report)) = readiness(State(check)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.error.as_deref(), Some("db down"));

        let check: Arc<dyn ReadinessCheck> = Arc::new(Fixed(Ok(())));
        let (status, Json(report)) = readiness(State(check)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");
    }
}
