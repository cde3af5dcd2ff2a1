//! Health check endpoints.

use super::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use firmenlauf_web::handlers::health::{readiness_response, ComponentHealth, HealthReport};

pub use firmenlauf_web::handlers::health::health_check;

/// Readiness check endpoint.
///
/// Returns 200 OK when storage answers, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"status":"healthy","version":"0.1.0","checks":[{"component":"storage","status":"healthy"}]}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let storage = match state.repository.ping().await {
        Ok(()) => ComponentHealth::healthy("storage"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            ComponentHealth::unhealthy("storage", e.to_string())
        },
    };

    readiness_response(env!("CARGO_PKG_VERSION"), vec![storage])
}
