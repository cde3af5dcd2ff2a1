//! Participant resources.
//!
//! - GET /api/participants/:id - Registration success page
//! - GET /api/participants/:id/already-registered - Existing registration and admin contact
//! - GET /api/events/:id/participants - Participants of an event

use super::events::storage_error;
use super::registrations::WAITLISTED_MESSAGE;
use crate::server::state::AppState;
use crate::types::{EventId, Participant, ParticipantId, RunningEvent};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use firmenlauf_web::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event summary embedded in participant resources.
#[derive(Debug, Serialize)]
pub struct EventSummary {
    /// Event ID
    pub id: Uuid,
    /// Event name
    pub name: String,
    /// Day of the run
    pub date: NaiveDate,
    /// Location
    pub location: String,
}

impl From<RunningEvent> for EventSummary {
    fn from(event: RunningEvent) -> Self {
        Self {
            id: *event.id.as_uuid(),
            name: event.name,
            date: event.date,
            location: event.location,
        }
    }
}

/// Registration success response.
#[derive(Debug, Serialize)]
pub struct RegistrationSuccessResponse {
    /// The registration
    pub participant: Participant,
    /// The event
    pub event: EventSummary,
    /// Waiting-list notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Already-registered response.
#[derive(Debug, Serialize)]
pub struct AlreadyRegisteredResponse {
    /// The existing registration
    pub participant: Participant,
    /// The event
    pub event: EventSummary,
    /// Whom to contact about changes
    pub admin_email: String,
}

/// Query parameters for listing participants.
#[derive(Debug, Default, Deserialize)]
pub struct ListParticipantsQuery {
    /// `true`: only the waiting list, `false`: only confirmed, absent: all
    pub waiting_list: Option<bool>,
}

/// Response for listing participants.
#[derive(Debug, Serialize)]
pub struct ListParticipantsResponse {
    /// Matching participants in registration order
    pub participants: Vec<Participant>,
    /// Number of entries
    pub total: usize,
}

async fn load(state: &AppState, id: Uuid) -> Result<(Participant, RunningEvent), AppError> {
    let participant = state
        .repository
        .get_participant(ParticipantId::from_uuid(id))
        .await
        .map_err(storage_error)?
        .ok_or_else(|| AppError::not_found("Participant", id))?;

    // Cascade delete keeps this consistent; a miss means a concurrent delete
    let event = state
        .repository
        .get_event(participant.event_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| AppError::not_found("Participant", id))?;

    Ok((participant, event))
}

/// Show a registration.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/participants/550e8400-e29b-41d4-a716-446655440000
/// ```
pub async fn registration_success(
    Path(participant_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RegistrationSuccessResponse>, AppError> {
    let (participant, event) = load(&state, participant_id).await?;

    Ok(Json(RegistrationSuccessResponse {
        message: participant.on_waiting_list.then_some(WAITLISTED_MESSAGE),
        participant,
        event: event.into(),
    }))
}

/// Show an existing registration with the administrator contact.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/participants/550e8400-e29b-41d4-a716-446655440000/already-registered
/// ```
pub async fn already_registered(
    Path(participant_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<AlreadyRegisteredResponse>, AppError> {
    let (participant, event) = load(&state, participant_id).await?;

    Ok(Json(AlreadyRegisteredResponse {
        participant,
        event: event.into(),
        admin_email: state.admin_email.to_string(),
    }))
}

/// List participants of an event.
///
/// # Example
///
/// ```bash
/// # Everyone
/// curl http://localhost:8080/api/events/550e8400-e29b-41d4-a716-446655440000/participants
///
/// # Waiting list only
/// curl "http://localhost:8080/api/events/550e8400-e29b-41d4-a716-446655440000/participants?waiting_list=true"
/// ```
pub async fn list_participants(
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListParticipantsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListParticipantsResponse>, AppError> {
    let id = EventId::from_uuid(event_id);
    if state
        .repository
        .get_event(id)
        .await
        .map_err(storage_error)?
        .is_none()
    {
        return Err(AppError::not_found("Event", event_id));
    }

    let participants: Vec<_> = state
        .repository
        .list_participants(id)
        .await
        .map_err(storage_error)?
        .into_iter()
        .filter(|p| query.waiting_list.map_or(true, |w| p.on_waiting_list == w))
        .collect();

    Ok(Json(ListParticipantsResponse {
        total: participants.len(),
        participants,
    }))
}
