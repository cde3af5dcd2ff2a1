//! Business metrics for event registration.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `registration_attempts_total{outcome}` - Finished attempts by outcome
//!   (`rejected_closed`, `rejected_invalid`, `rejected_duplicate`,
//!   `accepted_confirmed`, `accepted_waitlisted`, `error`)
//! - `registration_notifications_failed_total` - Administrator notices that
//!   could not be delivered
//!
//! ## Histograms
//! - `registration_duration_seconds` - Time to decide one attempt

use axum::routing::get;
use axum::Router;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Exporter installation failures
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Bucket configuration rejected
    #[error("failed to configure exporter: {0}")]
    Build(String),
    /// A global recorder is already installed
    #[error("failed to install recorder: {0}")]
    Install(String),
}

/// Register all metric descriptions.
///
/// Call once at start-up, before any metric is recorded.
pub fn register_metrics() {
    describe_counter!(
        "registration_attempts_total",
        "Total number of registration attempts by outcome"
    );
    describe_counter!(
        "registration_notifications_failed_total",
        "Administrator notices that could not be delivered"
    );
    describe_histogram!(
        "registration_duration_seconds",
        "Time taken to decide a registration attempt"
    );

    tracing::info!("Registration metrics registered");
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Returns [`MetricsError`] if the recorder cannot be installed.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    register_metrics();

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))
}

/// Router serving `GET /metrics` in the Prometheus text format.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

/// Record a finished attempt.
pub fn record_attempt(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("registration_attempts_total", "outcome" => outcome).increment(1);
    metrics::histogram!("registration_duration_seconds").record(elapsed.as_secs_f64());
    tracing::debug!(outcome, elapsed_ms = elapsed.as_millis(), "Recorded registration attempt");
}

/// Record an undeliverable administrator notice.
pub fn record_notification_failed() {
    metrics::counter!("registration_notifications_failed_total").increment(1);
}
