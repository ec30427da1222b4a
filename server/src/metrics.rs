//! Business metrics for the booking platform.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `demoride_bookings_reserved_total` - Seats successfully reserved
//! - `demoride_booking_rejections_total{reason}` - Reservations refused, by error code
//! - `demoride_booking_status_changes_total{status}` - Lifecycle transitions, by target status
//! - `demoride_bookings_cancelled_total` - Cancellations (seat released)
//! - `demoride_notifications_total{kind, outcome}` - Rider emails, delivered or failed
//! - `demoride_http_requests_total{method, status}` - Recorded by the request tracking layer
//!
//! ## Histograms
//! - `demoride_store_reserve_seconds` - Time spent in the reservation transaction
//! - `demoride_http_request_duration_seconds` - Request latency

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register descriptions.
///
/// Call once at startup; the handle renders the scrape body for `/metrics`.
///
/// # Errors
///
/// Fails if a global recorder is already installed.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))?;
    register_business_metrics();
    Ok(handle)
}

/// Register all metric descriptions.
pub fn register_business_metrics() {
    describe_counter!(
        "demoride_bookings_reserved_total",
        "Total number of seats successfully reserved"
    );
    describe_counter!(
        "demoride_booking_rejections_total",
        "Reservations refused by the capacity guard, by reason code"
    );
    describe_counter!(
        "demoride_booking_status_changes_total",
        "Booking lifecycle transitions by target status"
    );
    describe_counter!(
        "demoride_bookings_cancelled_total",
        "Total number of cancelled bookings"
    );
    describe_counter!(
        "demoride_notifications_total",
        "Rider notifications by kind and outcome"
    );
    describe_histogram!(
        "demoride_store_reserve_seconds",
        "Time spent in the reservation transaction"
    );
    describe_counter!(
        "demoride_http_requests_total",
        "HTTP requests by method and status"
    );
    describe_histogram!(
        "demoride_http_request_duration_seconds",
        "HTTP request latency"
    );

    tracing::info!("Business metrics registered");
}

/// Record a successful reservation.
pub fn record_booking_reserved() {
    metrics::counter!("demoride_bookings_reserved_total").increment(1);
}

/// Record a refused reservation.
///
/// # Arguments
///
/// * `reason` - Stable error code, e.g. `SLOT_FULL`
pub fn record_booking_rejected(reason: &'static str) {
    metrics::counter!("demoride_booking_rejections_total", "reason" => reason).increment(1);
    tracing::debug!(reason, "Recorded booking_rejected metric");
}

/// Record a lifecycle transition.
pub fn record_status_change(status: &'static str) {
    metrics::counter!("demoride_booking_status_changes_total", "status" => status).increment(1);
    if status == "CANCELLED" {
        metrics::counter!("demoride_bookings_cancelled_total").increment(1);
    }
}

/// Record a notification attempt.
pub fn record_notification(kind: &'static str, delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    metrics::counter!("demoride_notifications_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}
