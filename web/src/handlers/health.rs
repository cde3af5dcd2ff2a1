//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// Does NOT check dependencies (database, etc.).
///
/// ```text
/// GET /health  →  200 "ok"
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Health status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component works normally
    Healthy,
    /// Component cannot serve requests
    Unhealthy,
}

/// Health of one dependency
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name (e.g. "storage")
    pub component: String,
    /// Current status
    pub status: HealthStatus,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Healthy component
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Unhealthy component with a reason
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Aggregated readiness report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status of all checks
    pub status: HealthStatus,
    /// Service version
    pub version: &'static str,
    /// Individual checks
    pub checks: Vec<ComponentHealth>,
}

/// Build a readiness response from component checks.
///
/// - 200 OK: all components healthy
/// - 503 Service Unavailable: any component unhealthy
#[must_use]
pub fn readiness_response(
    version: &'static str,
    checks: Vec<ComponentHealth>,
) -> (StatusCode, Json<HealthReport>) {
    let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(HealthReport { status, version, checks }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[test]
    fn readiness_is_ok_when_all_healthy() {
        let (status, Json(report)) =
            readiness_response("0.1.0", vec![ComponentHealth::healthy("storage")]);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[test]
    fn readiness_fails_on_unhealthy_component() {
        let (status, Json(report)) = readiness_response(
            "0.1.0",
            vec![
                ComponentHealth::healthy("notifier"),
                ComponentHealth::unhealthy("storage", "connection refused"),
            ],
        );
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.checks.len(), 2);
    }
}
