//! In-memory repository for development and tests.

use super::{Placement, RegistrationRepository, StorageError};
use crate::types::{
    DuplicateKey, EventId, NewEvent, NewParticipant, Participant, ParticipantId, RunningEvent,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    events: HashMap<EventId, RunningEvent>,
    /// Insertion order doubles as registration order
    participants: Vec<Participant>,
}

impl Tables {
    fn find(&self, event_id: EventId, key: &DuplicateKey) -> Option<&Participant> {
        self.participants.iter().find(|p| {
            p.event_id == event_id
                && p.name == key.name
                && p.department == key.department
                && p.year_of_birth == key.year_of_birth
        })
    }

    fn count(&self, event_id: EventId, excluding_waiting_list: bool) -> u32 {
        let count = self
            .participants
            .iter()
            .filter(|p| p.event_id == event_id && !(excluding_waiting_list && p.on_waiting_list))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Repository keeping all records in process memory
///
/// All operations on one instance are serialized by a single lock, which makes
/// `create_participant` atomic.
#[derive(Default)]
pub struct InMemoryRegistrationRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRegistrationRepository {
    /// Empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed event (fixtures and seeding)
    pub async fn insert_event(&self, event: RunningEvent) {
        self.tables.write().await.events.insert(event.id, event);
    }

    /// Insert a participant as-is, bypassing checks (fixtures)
    pub async fn insert_participant(&self, participant: Participant) {
        self.tables.write().await.participants.push(participant);
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn get_event(&self, id: EventId) -> Result<Option<RunningEvent>, StorageError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<RunningEvent>, StorageError> {
        let mut events: Vec<_> = self.tables.read().await.events.values().cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Ok(events)
    }

    async fn count_participants(
        &self,
        event_id: EventId,
        excluding_waiting_list: bool,
    ) -> Result<u32, StorageError> {
        Ok(self.tables.read().await.count(event_id, excluding_waiting_list))
    }

    async fn find_participant(
        &self,
        event_id: EventId,
        key: &DuplicateKey,
    ) -> Result<Option<Participant>, StorageError> {
        Ok(self.tables.read().await.find(event_id, key).cloned())
    }

    async fn create_participant(&self, new: NewParticipant) -> Result<Placement, StorageError> {
        let mut tables = self.tables.write().await;

        let max = tables
            .events
            .get(&new.event_id)
            .ok_or(StorageError::EventNotFound(new.event_id))?
            .max_participants;

        if let Some(existing) = tables.find(new.event_id, &new.applicant.duplicate_key()) {
            return Ok(Placement::Duplicate(existing.clone()));
        }

        let confirmed = tables.count(new.event_id, true);
        let full = max.is_some_and(|max| confirmed >= max.get());
        let on_waiting_list = new.on_waiting_list || full;
        let participant = new.into_participant(on_waiting_list);

        tables.participants.push(participant.clone());
        Ok(Placement::Created(participant))
    }

    async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participant>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn create_event(&self, new: NewEvent) -> Result<RunningEvent, StorageError> {
        let event = RunningEvent {
            id: EventId::new(),
            name: new.name,
            date: new.date,
            location: new.location,
            description: new.description,
            registration_deadline: new.registration_deadline,
            max_participants: new.max_participants,
            created_at: Utc::now(),
        };
        self.insert_event(event.clone()).await;
        Ok(event)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let existed = tables.events.remove(&id).is_some();
        tables.participants.retain(|p| p.event_id != id);
        Ok(existed)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
