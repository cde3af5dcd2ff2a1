//! Actions of the registration workflow.

use super::types::{RegistrationError, RegistrationOutcome};
use crate::store::{Placement, StorageError};
use crate::types::{Applicant, EventId, Participant, RunningEvent};
use chrono::NaiveDate;

/// Input and feedback actions of one registration attempt.
///
/// `Submit` starts the attempt. The storage effects answer with the
/// intermediate actions; `Completed` or `Failed` close it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Start an attempt
    Submit {
        /// Target event
        event_id: EventId,
        /// Raw form input
        applicant: Applicant,
        /// Reference date; `None` asks the environment clock
        today: Option<NaiveDate>,
    },

    /// The event was loaded
    EventLoaded {
        /// The event
        event: RunningEvent,
    },

    /// No event with the requested ID
    EventMissing,

    /// Result of the duplicate lookup
    DuplicateChecked {
        /// Matching registration, if any
        existing: Option<Participant>,
    },

    /// Result of the capacity check
    SpotsChecked {
        /// Whether a confirmed spot is left
        available: bool,
    },

    /// The insert finished
    ParticipantStored {
        /// What storage did
        placement: Placement,
    },

    /// The caller stopped waiting. Aborts the attempt unless the insert
    /// is already running.
    Expired,

    /// A storage call failed
    StorageFailed {
        /// The failure
        error: StorageError,
    },

    /// The attempt was decided
    Completed {
        /// The decision
        outcome: RegistrationOutcome,
    },

    /// The attempt was aborted
    Failed {
        /// Why
        error: RegistrationError,
    },
}

impl RegistrationAction {
    /// `Completed` or `Failed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
