//! `PostgreSQL`-backed repository.
//!
//! Tables are created by the migrations in `registration/migrations`.
//!
//! # Concurrency
//!
//! `create_participant` runs in one transaction that locks the event row
//! (`SELECT ... FOR UPDATE`). Concurrent inserts for the same event therefore
//! queue up, and each sees the duplicate key and confirmed count left by the
//! previous one. The `participants_duplicate_key` unique index backs the
//! duplicate check at storage level.

use super::{Placement, RegistrationRepository, StorageError};
use crate::types::{
    DuplicateKey, EventId, NewEvent, NewParticipant, Participant, ParticipantId, RunningEvent,
    TShirtSize,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, name, date, location, description, registration_deadline, \
                             max_participants, created_at";

const PARTICIPANT_COLUMNS: &str = "id, event_id, name, department, year_of_birth, tshirt_size, \
                                   email, on_waiting_list, registered_at";

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    date: NaiveDate,
    location: String,
    description: String,
    registration_deadline: Option<NaiveDate>,
    max_participants: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for RunningEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            date: row.date,
            location: row.location,
            description: row.description,
            registration_deadline: row.registration_deadline,
            // CHECK (max_participants > 0) guarantees the conversion
            max_participants: row
                .max_participants
                .and_then(|m| u32::try_from(m).ok())
                .and_then(NonZeroU32::new),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ParticipantRow {
    id: Uuid,
    event_id: Uuid,
    name: String,
    department: String,
    year_of_birth: i32,
    tshirt_size: String,
    email: String,
    on_waiting_list: bool,
    registered_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = StorageError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        let tshirt_size: TShirtSize = row
            .tshirt_size
            .parse()
            .map_err(|e| StorageError::Unavailable(format!("corrupt participant row: {e}")))?;

        Ok(Self {
            id: ParticipantId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            name: row.name,
            department: row.department,
            year_of_birth: row.year_of_birth,
            tshirt_size,
            email: row.email,
            on_waiting_list: row.on_waiting_list,
            registered_at: row.registered_at,
        })
    }
}

fn unavailable(context: &str) -> impl FnOnce(sqlx::Error) -> StorageError + '_ {
    move |e| StorageError::Unavailable(format!("{context}: {e}"))
}

fn to_count(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Repository backed by a `PostgreSQL` connection pool
#[derive(Clone)]
pub struct PostgresRegistrationRepository {
    pool: Arc<PgPool>,
}

impl PostgresRegistrationRepository {
    /// Wrap an existing pool. Migrations must have been applied.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to run migrations: {e}")))
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRegistrationRepository {
    #[tracing::instrument(skip(self))]
    async fn get_event(&self, id: EventId) -> Result<Option<RunningEvent>, StorageError> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM running_events WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool.as_ref())
                .await
                .map_err(unavailable("Failed to load event"))?;

        Ok(row.map(RunningEvent::from))
    }

    #[tracing::instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<RunningEvent>, StorageError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM running_events ORDER BY date, name"
        ))
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to list events"))?;

        Ok(rows.into_iter().map(RunningEvent::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn count_participants(
        &self,
        event_id: EventId,
        excluding_waiting_list: bool,
    ) -> Result<u32, StorageError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participants
             WHERE event_id = $1 AND (NOT $2 OR NOT on_waiting_list)",
        )
        .bind(event_id.as_uuid())
        .bind(excluding_waiting_list)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to count participants"))?;

        Ok(to_count(count))
    }

    #[tracing::instrument(skip(self))]
    async fn find_participant(
        &self,
        event_id: EventId,
        key: &DuplicateKey,
    ) -> Result<Option<Participant>, StorageError> {
        let row: Option<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE event_id = $1 AND name = $2 AND department = $3 AND year_of_birth = $4"
        ))
        .bind(event_id.as_uuid())
        .bind(&key.name)
        .bind(&key.department)
        .bind(key.year_of_birth)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to look up participant"))?;

        row.map(Participant::try_from).transpose()
    }

    #[tracing::instrument(skip(self, new), fields(event_id = %new.event_id))]
    async fn create_participant(&self, new: NewParticipant) -> Result<Placement, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(unavailable("Failed to begin transaction"))?;

        // Serializes all inserts for this event until commit
        let locked: Option<(Option<i32>,)> =
            sqlx::query_as("SELECT max_participants FROM running_events WHERE id = $1 FOR UPDATE")
                .bind(new.event_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(unavailable("Failed to lock event"))?;
        let Some((max_participants,)) = locked else {
            return Err(StorageError::EventNotFound(new.event_id));
        };

        let key = new.applicant.duplicate_key();
        let existing: Option<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE event_id = $1 AND name = $2 AND department = $3 AND year_of_birth = $4"
        ))
        .bind(new.event_id.as_uuid())
        .bind(&key.name)
        .bind(&key.department)
        .bind(key.year_of_birth)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable("Failed to re-check duplicate"))?;
        if let Some(row) = existing {
            tracing::info!("Duplicate detected during insert");
            return Ok(Placement::Duplicate(row.try_into()?));
        }

        let (confirmed,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participants WHERE event_id = $1 AND NOT on_waiting_list",
        )
        .bind(new.event_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable("Failed to re-count participants"))?;
        let full = max_participants.is_some_and(|max| confirmed >= i64::from(max));
        if full && !new.on_waiting_list {
            tracing::info!("Event filled up concurrently, placing on waiting list");
        }

        let on_waiting_list = new.on_waiting_list || full;
        let participant = new.into_participant(on_waiting_list);
        let inserted: Option<ParticipantRow> = sqlx::query_as(&format!(
            "INSERT INTO participants ({PARTICIPANT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (event_id, name, department, year_of_birth) DO NOTHING
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(participant.id.as_uuid())
        .bind(participant.event_id.as_uuid())
        .bind(&participant.name)
        .bind(&participant.department)
        .bind(participant.year_of_birth)
        .bind(participant.tshirt_size.code())
        .bind(&participant.email)
        .bind(participant.on_waiting_list)
        .bind(participant.registered_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable("Failed to insert participant"))?;

        let placement = match inserted {
            Some(row) => Placement::Created(row.try_into()?),
            None => {
                let row: ParticipantRow = sqlx::query_as(&format!(
                    "SELECT {PARTICIPANT_COLUMNS} FROM participants
                     WHERE event_id = $1 AND name = $2 AND department = $3 AND year_of_birth = $4"
                ))
                .bind(participant.event_id.as_uuid())
                .bind(&participant.name)
                .bind(&participant.department)
                .bind(participant.year_of_birth)
                .fetch_one(&mut *tx)
                .await
                .map_err(unavailable("Failed to load conflicting participant"))?;
                Placement::Duplicate(row.try_into()?)
            },
        };

        tx.commit()
            .await
            .map_err(unavailable("Failed to commit participant"))?;

        Ok(placement)
    }

    #[tracing::instrument(skip(self))]
    async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, StorageError> {
        let row: Option<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to load participant"))?;

        row.map(Participant::try_from).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participant>, StorageError> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants
             WHERE event_id = $1 ORDER BY registered_at, name"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to list participants"))?;

        rows.into_iter().map(Participant::try_from).collect()
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    async fn create_event(&self, new: NewEvent) -> Result<RunningEvent, StorageError> {
        let max_participants = new
            .max_participants
            .map(|m| i32::try_from(m.get()))
            .transpose()
            .map_err(|_| StorageError::Unavailable("max_participants out of range".to_string()))?;

        let row: EventRow = sqlx::query_as(&format!(
            "INSERT INTO running_events
                (id, name, date, location, description, registration_deadline, max_participants)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(EventId::new().as_uuid())
        .bind(&new.name)
        .bind(new.date)
        .bind(&new.location)
        .bind(&new.description)
        .bind(new.registration_deadline)
        .bind(max_participants)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(unavailable("Failed to create event"))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_event(&self, id: EventId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM running_events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool.as_ref())
            .await
            .map_err(unavailable("Failed to delete event"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(unavailable("Database ping failed"))?;
        Ok(())
    }
}
