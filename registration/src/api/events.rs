//! Event listing endpoints.
//!
//! - GET /api/events - Events open for registration, ordered by date
//! - GET /api/events/:id - Event details with capacity

use crate::eligibility::{self, Availability};
use crate::server::state::AppState;
use crate::types::{EventId, RunningEvent};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use firmenlauf_web::AppError;
use serde::Serialize;
use uuid::Uuid;

/// Event details response.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID
    pub id: Uuid,
    /// Event name
    pub name: String,
    /// Day of the run
    pub date: NaiveDate,
    /// Location
    pub location: String,
    /// Description
    pub description: String,
    /// Last day to register
    pub registration_deadline: Option<NaiveDate>,
    /// Capacity, `null` if unlimited
    pub max_participants: Option<u32>,
    /// Capacity and open state
    #[serde(flatten)]
    pub availability: Availability,
}

impl EventResponse {
    fn new(event: RunningEvent, availability: Availability) -> Self {
        Self {
            id: *event.id.as_uuid(),
            name: event.name,
            date: event.date,
            location: event.location,
            description: event.description,
            registration_deadline: event.registration_deadline,
            max_participants: event.max_participants.map(|m| m.get()),
            availability,
        }
    }
}

/// Response for listing events.
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Open events
    pub events: Vec<EventResponse>,
}

pub(crate) fn storage_error(error: crate::store::StorageError) -> AppError {
    AppError::unavailable("Storage is unavailable").with_source(error)
}

/// List events whose registration is open today.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/events
/// ```
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, AppError> {
    let today = state.clock.today();
    let all = state.repository.list_events().await.map_err(storage_error)?;

    let mut events = Vec::new();
    for event in all.into_iter().filter(|e| e.is_registration_open(today)) {
        let availability = eligibility::availability(state.repository.as_ref(), &event, today)
            .await
            .map_err(storage_error)?;
        events.push(EventResponse::new(event, availability));
    }

    Ok(Json(ListEventsResponse { events }))
}

/// Get event details by ID.
///
/// Closed events are still returned, with `registration_open: false`.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/events/550e8400-e29b-41d4-a716-446655440000
/// ```
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .repository
        .get_event(EventId::from_uuid(event_id))
        .await
        .map_err(storage_error)?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;

    let availability =
        eligibility::availability(state.repository.as_ref(), &event, state.clock.today())
            .await
            .map_err(storage_error)?;

    Ok(Json(EventResponse::new(event, availability)))
}
