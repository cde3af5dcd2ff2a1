//! Persistence of events and participants.
//!
//! [`RegistrationRepository`] is the storage contract the workflow and the HTTP
//! layer depend on. Two implementations exist: [`InMemoryRegistrationRepository`]
//! for development and tests, and [`PostgresRegistrationRepository`].
//!
//! `create_participant` is the only write on the registration path. It re-checks
//! the duplicate key and the confirmed count atomically, so two concurrent
//! attempts can neither overbook an event nor register the same person twice.

use crate::types::{
    DuplicateKey, EventId, NewEvent, NewParticipant, Participant, ParticipantId, RunningEvent,
};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRegistrationRepository;
pub use postgres::PostgresRegistrationRepository;

/// Storage failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store could not serve the request
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The referenced event does not exist (anymore)
    #[error("event {0} not found")]
    EventNotFound(EventId),
}

/// Result of a participant insert
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The participant was stored. Its waiting-list flag may have been set by
    /// the in-transaction capacity re-check.
    Created(Participant),
    /// A participant with the same duplicate key already exists; nothing was stored
    Duplicate(Participant),
}

/// Storage contract for events and participants
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Look up an event
    async fn get_event(&self, id: EventId) -> Result<Option<RunningEvent>, StorageError>;

    /// All events ordered by date
    async fn list_events(&self) -> Result<Vec<RunningEvent>, StorageError>;

    /// Count participants of an event, optionally leaving out the waiting list
    async fn count_participants(
        &self,
        event_id: EventId,
        excluding_waiting_list: bool,
    ) -> Result<u32, StorageError>;

    /// Exact match on the duplicate key within one event
    async fn find_participant(
        &self,
        event_id: EventId,
        key: &DuplicateKey,
    ) -> Result<Option<Participant>, StorageError>;

    /// Insert a participant.
    ///
    /// Atomically re-checks the duplicate key and demotes the participant to
    /// the waiting list when the event filled up in the meantime.
    async fn create_participant(&self, new: NewParticipant) -> Result<Placement, StorageError>;

    /// Look up a participant
    async fn get_participant(&self, id: ParticipantId)
    -> Result<Option<Participant>, StorageError>;

    /// Participants of an event in registration order
    async fn list_participants(&self, event_id: EventId)
    -> Result<Vec<Participant>, StorageError>;

    /// Create an event (administrative)
    async fn create_event(&self, new: NewEvent) -> Result<RunningEvent, StorageError>;

    /// Delete an event and, by cascade, its participants. Returns false if it did not exist.
    async fn delete_event(&self, id: EventId) -> Result<bool, StorageError>;

    /// Connectivity probe for readiness checks
    async fn ping(&self) -> Result<(), StorageError>;
}
