//! Registration endpoint.
//!
//! - POST /api/events/:id/registrations - Register for an event
//!
//! | Outcome               | Status |
//! |-----------------------|--------|
//! | `ACCEPTED_CONFIRMED`  | 201    |
//! | `ACCEPTED_WAITLISTED` | 202    |
//! | `REJECTED_CLOSED`     | 403    |
//! | `REJECTED_DUPLICATE`  | 409    |
//! | `REJECTED_INVALID`    | 422    |

use crate::server::state::AppState;
use crate::types::{Applicant, EventId, Participant};
use crate::validation::FieldErrors;
use crate::workflow::{RegistrationError, RegistrationOutcome};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use firmenlauf_web::{AppError, CorrelationId};
use serde::Serialize;
use uuid::Uuid;

/// Shown with a waiting-list placement
pub const WAITLISTED_MESSAGE: &str =
    "No spots available. You have been placed on the waiting list.";
/// Shown when the deadline has passed
pub const CLOSED_MESSAGE: &str = "Registration for this event is closed.";
/// Shown when the person is already registered
pub const DUPLICATE_MESSAGE: &str = "You are already registered for this event.";

/// Body of every registration response.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    /// `REJECTED_*` or `ACCEPTED_*`
    pub outcome: &'static str,
    /// Human readable summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    /// The new participant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
    /// The registration that already exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_participant_id: Option<Uuid>,
    /// Resource to show next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Validation messages by field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl RegistrationResponse {
    const fn bare(outcome: &'static str) -> Self {
        Self {
            outcome,
            message: None,
            participant: None,
            existing_participant_id: None,
            redirect: None,
            errors: None,
        }
    }
}

/// Map a decided attempt to its HTTP status and body.
#[must_use]
pub fn outcome_response(outcome: RegistrationOutcome) -> (StatusCode, RegistrationResponse) {
    match outcome {
        RegistrationOutcome::Closed => (
            StatusCode::FORBIDDEN,
            RegistrationResponse {
                message: Some(CLOSED_MESSAGE),
                ..RegistrationResponse::bare("REJECTED_CLOSED")
            },
        ),
        RegistrationOutcome::Invalid { errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegistrationResponse {
                errors: Some(errors),
                ..RegistrationResponse::bare("REJECTED_INVALID")
            },
        ),
        RegistrationOutcome::Duplicate { existing } => (
            StatusCode::CONFLICT,
            RegistrationResponse {
                message: Some(DUPLICATE_MESSAGE),
                existing_participant_id: Some(*existing.id.as_uuid()),
                redirect: Some(format!("/api/participants/{}/already-registered", existing.id)),
                ..RegistrationResponse::bare("REJECTED_DUPLICATE")
            },
        ),
        RegistrationOutcome::Confirmed { participant } => (
            StatusCode::CREATED,
            RegistrationResponse {
                redirect: Some(format!("/api/participants/{}", participant.id)),
                participant: Some(participant),
                ..RegistrationResponse::bare("ACCEPTED_CONFIRMED")
            },
        ),
        RegistrationOutcome::Waitlisted { participant } => (
            StatusCode::ACCEPTED,
            RegistrationResponse {
                message: Some(WAITLISTED_MESSAGE),
                redirect: Some(format!("/api/participants/{}", participant.id)),
                participant: Some(participant),
                ..RegistrationResponse::bare("ACCEPTED_WAITLISTED")
            },
        ),
    }
}

impl From<RegistrationError> for AppError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::EventNotFound(id) => Self::not_found("Event", id),
            RegistrationError::Storage(e) => {
                Self::unavailable("Storage is unavailable").with_source(e)
            },
            RegistrationError::Timeout => Self::timeout("Registration timed out"),
            RegistrationError::Runtime(message) => {
                Self::internal("Registration could not be processed")
                    .with_source(anyhow::anyhow!(message))
            },
        }
    }
}

/// Decode the form; only a body that is not a JSON object is rejected here.
/// Mistyped fields are left to the workflow, which reports them per field.
fn parse_form(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Applicant, AppError> {
    let malformed = |reason: String| {
        AppError::bad_request("Malformed registration form")
            .with_details(serde_json::json!({ "reason": reason }))
    };

    let Json(value) = body.map_err(|rejection| malformed(rejection.body_text()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Register for an event.
///
/// All fields are required; missing or mistyped ones are reported per
/// field. A body that is not a JSON object is rejected with 400.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/550e8400-e29b-41d4-a716-446655440000/registrations \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Ann Example",
///     "department": "Engineering",
///     "year_of_birth": 1990,
///     "tshirt_size": "M",
///     "email": "ann@example.com"
///   }'
/// ```
#[tracing::instrument(skip(state, body, correlation_id), fields(correlation_id = %correlation_id.0))]
pub async fn register(
    correlation_id: CorrelationId,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    let applicant = parse_form(body)?;

    let outcome = state
        .registrations
        .register(EventId::from_uuid(event_id), applicant, None)
        .await?;

    let (status, body) = outcome_response(outcome);
    Ok((status, Json(body)))
}
