//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{events, participants, registrations};
use axum::{
    routing::{get, post},
    Router,
};
use firmenlauf_web::correlation_id_layer;

/// Build the complete Axum router.
///
/// - `/health`, `/ready`
/// - `/api/events`, `/api/events/:id`
/// - `/api/events/:id/registrations`, `/api/events/:id/participants`
/// - `/api/participants/:id`, `/api/participants/:id/already-registered`
///
/// Every request runs inside a correlation-id span.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/registrations", post(registrations::register))
        .route("/events/:id/participants", get(participants::list_participants))
        .route("/participants/:id", get(participants::registration_success))
        .route(
            "/participants/:id/already-registered",
            get(participants::already_registered),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(correlation_id_layer())
        .with_state(state)
}
