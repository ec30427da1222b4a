//! Axum middleware for request tracking and observability.
//!
//! The request tracking layer:
//! - **Extracts** the correlation ID from `X-Correlation-ID` (or generates a UUID)
//! - **Stores** it in request extensions as [`CorrelationId`]
//! - **Wraps** the request in a tracing span carrying the correlation ID
//! - **Records** request count and latency metrics by method and status
//! - **Echoes** the correlation ID in the response header
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use demoride_web::middleware::request_tracking_layer;
//!
//! let app = Router::new()
//!     .route("/api/events", get(list_events))
//!     .layer(request_tracking_layer());
//! ```

use crate::extractors::CorrelationId;
use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that tracks every request.
#[must_use]
pub const fn request_tracking_layer() -> RequestTrackingLayer {
    RequestTrackingLayer
}

/// Layer for request tracking.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestTrackingLayer;

impl<S> Layer<S> for RequestTrackingLayer {
    type Service = RequestTracking<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTracking { inner }
    }
}

/// Middleware service for request tracking.
#[derive(Clone, Debug)]
pub struct RequestTracking<S> {
    inner: S,
}

impl<S> Service<Request> for RequestTracking<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(CorrelationId(correlation_id));

        let method = req.method().to_string();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %method,
            path = %req.uri().path(),
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;

                let status = response.status().as_u16().to_string();
                let elapsed = started.elapsed().as_secs_f64();
                metrics::counter!(
                    "demoride_http_requests_total",
                    "method" => method.clone(),
                    "status" => status.clone()
                )
                .increment(1);
                metrics::histogram!("demoride_http_request_duration_seconds", "method" => method)
                    .record(elapsed);
                tracing::debug!(status = %status, elapsed_ms = elapsed * 1000.0, "Request completed");

                if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}
