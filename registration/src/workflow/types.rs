//! State, outcomes and errors of a registration attempt.

use crate::store::StorageError;
use crate::types::{Applicant, EventId, Participant, RunningEvent, ValidApplicant};
use crate::validation::FieldErrors;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Where an attempt stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Submitted, event being loaded
    Received,
    /// Validating fields, checking duplicates and capacity
    Validating,
    /// Participant being written
    Storing,
    /// Decided; see [`RegistrationState::outcome`]
    Completed,
    /// Aborted; see [`RegistrationState::error`]
    Failed,
}

/// Decision for one registration attempt
///
/// Serialized with an `outcome` tag (`REJECTED_CLOSED`, `REJECTED_INVALID`,
/// `REJECTED_DUPLICATE`, `ACCEPTED_CONFIRMED`, `ACCEPTED_WAITLISTED`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome")]
pub enum RegistrationOutcome {
    /// The deadline has passed; no validation was performed
    #[serde(rename = "REJECTED_CLOSED")]
    Closed,
    /// Field validation failed
    #[serde(rename = "REJECTED_INVALID")]
    Invalid {
        /// Messages by field
        errors: FieldErrors,
    },
    /// The same person is already registered for this event
    #[serde(rename = "REJECTED_DUPLICATE")]
    Duplicate {
        /// The existing registration
        existing: Participant,
    },
    /// Registered with a spot
    #[serde(rename = "ACCEPTED_CONFIRMED")]
    Confirmed {
        /// The new participant
        participant: Participant,
    },
    /// Registered on the waiting list
    #[serde(rename = "ACCEPTED_WAITLISTED")]
    Waitlisted {
        /// The new participant
        participant: Participant,
    },
}

impl RegistrationOutcome {
    /// Stable lower-case label used for metrics and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "rejected_closed",
            Self::Invalid { .. } => "rejected_invalid",
            Self::Duplicate { .. } => "rejected_duplicate",
            Self::Confirmed { .. } => "accepted_confirmed",
            Self::Waitlisted { .. } => "accepted_waitlisted",
        }
    }

    /// The participant created by this attempt, if any
    #[must_use]
    pub const fn created(&self) -> Option<&Participant> {
        match self {
            Self::Confirmed { participant } | Self::Waitlisted { participant } => Some(participant),
            _ => None,
        }
    }
}

/// Failures that abort an attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// No event with this ID
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// Storage could not serve the attempt
    #[error(transparent)]
    Storage(StorageError),

    /// The attempt did not finish in time
    #[error("registration timed out")]
    Timeout,

    /// The runtime rejected the attempt (e.g. during shutdown)
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<StorageError> for RegistrationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::EventNotFound(id) => Self::EventNotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// State of one registration attempt
#[derive(Clone, Debug, Default)]
pub struct RegistrationState {
    /// Progress
    pub phase: Phase,
    /// Target event
    pub event_id: Option<EventId>,
    /// Reference date for the deadline check
    pub today: Option<NaiveDate>,
    /// Raw input
    pub applicant: Option<Applicant>,
    /// Loaded event
    pub event: Option<RunningEvent>,
    /// Input after validation
    pub valid: Option<ValidApplicant>,
    /// Final decision
    pub outcome: Option<RegistrationOutcome>,
    /// Abort reason
    pub error: Option<RegistrationError>,
}

impl RegistrationState {
    /// Whether the attempt reached a terminal phase
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Failed)
    }
}
