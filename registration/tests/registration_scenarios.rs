//! End-to-end registration attempts through the `Store` runtime and the
//! in-memory repository.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

mod common;

use async_trait::async_trait;
use common::{applicant, date, Harness};
use firmenlauf_registration::store::{
    InMemoryRegistrationRepository, Placement, RegistrationRepository, StorageError,
};
use firmenlauf_registration::types::{
    DuplicateKey, EventId, NewEvent, NewParticipant, Participant, ParticipantId, RunningEvent,
};
use firmenlauf_registration::workflow::{
    RegistrationEnvironment, RegistrationError, RegistrationOutcome, RegistrationService,
};
use firmenlauf_testing::clock_on;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn open_unlimited_event_confirms() {
    let h = Harness::new();
    let event = h.event(None, None).await;

    let outcome = h
        .service
        .register(event.id, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap();

    let RegistrationOutcome::Confirmed { participant } = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert!(!participant.on_waiting_list);
    assert_eq!(participant.name, "Ann");
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 1);
}

#[tokio::test]
async fn full_event_waitlists_third_applicant() {
    let h = Harness::new();
    let event = h.event(None, Some(2)).await;

    for name in ["Ann", "Bob"] {
        let outcome = h
            .service
            .register(event.id, applicant(name, "Eng", 1990), None)
            .await
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Confirmed { .. }));
    }

    let outcome = h
        .service
        .register(event.id, applicant("Cid", "Eng", 1990), None)
        .await
        .unwrap();
    let RegistrationOutcome::Waitlisted { participant } = outcome else {
        panic!("expected waiting list, got {outcome:?}");
    };
    assert!(participant.on_waiting_list);
    assert_eq!(h.repository.count_participants(event.id, true).await.unwrap(), 2);
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 3);
}

#[tokio::test]
async fn past_deadline_is_closed_and_creates_nothing() {
    let h = Harness::new();
    let event = h.event(Some(date(2025, 4, 30)), None).await;

    let outcome = h
        .service
        .register(event.id, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::Closed);
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 0);
}

#[tokio::test]
async fn explicit_date_is_used_for_the_deadline() {
    let h = Harness::new();
    let event = h.event(Some(date(2025, 5, 10)), None).await;

    let outcome = h
        .service
        .register(event.id, applicant("Ann", "Eng", 1990), Some(date(2025, 5, 11)))
        .await
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Closed);
}

#[tokio::test]
async fn same_person_is_rejected_as_duplicate_and_admin_notified() {
    let h = Harness::new();
    let event = h.event(None, None).await;

    let RegistrationOutcome::Confirmed { participant: original } = h
        .service
        .register(event.id, applicant("Ann", "Eng", 2000), None)
        .await
        .unwrap()
    else {
        panic!("first registration should be confirmed");
    };

    let mut again = applicant("Ann", "Eng", 2000);
    again.email = Some("ann.private@example.org".to_string());
    again.tshirt_size = Some("XL".to_string());

    let outcome = h.service.register(event.id, again, None).await.unwrap();
    assert_eq!(
        outcome,
        RegistrationOutcome::Duplicate {
            existing: original.clone()
        }
    );
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 1);

    // Notification runs concurrently with the response
    let mut notices = Vec::new();
    for _ in 0..50 {
        notices = h.notifier.notices.lock().await.clone();
        if !notices.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(notices.len(), 1);
    let (to, notice) = &notices[0];
    assert_eq!(to, "admin@example.com");
    assert_eq!(notice.existing_participant_id, original.id);
    assert_eq!(notice.applicant_email, "ann.private@example.org");
}

#[tokio::test]
async fn same_triple_for_another_event_is_not_a_duplicate() {
    let h = Harness::new();
    let first = h.event(None, None).await;
    let second = h.event(None, None).await;

    for event in [&first, &second] {
        let outcome = h
            .service
            .register(event.id, applicant("Ann", "Eng", 2000), None)
            .await
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Confirmed { .. }));
    }
}

#[tokio::test]
async fn invalid_input_creates_nothing() {
    let h = Harness::new();
    let event = h.event(None, Some(1)).await;

    let mut bad = applicant("Ann", "Eng", 1990);
    bad.email = Some("ann-at-example.com".to_string());

    let outcome = h.service.register(event.id, bad, None).await.unwrap();
    let RegistrationOutcome::Invalid { errors } = outcome else {
        panic!("expected invalid outcome");
    };
    assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_event_is_an_error() {
    let h = Harness::new();
    let missing = EventId::new();

    let err = h
        .service
        .register(missing, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap_err();
    assert_eq!(err, RegistrationError::EventNotFound(missing));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_never_overbook() {
    let h = Harness::new();
    let event = h.event(None, Some(5)).await;

    let attempts = (0..40).map(|i| {
        let service = h.service.clone();
        let event_id = event.id;
        tokio::spawn(async move {
            service
                .register(event_id, applicant(&format!("Runner {i}"), "Ops", 1985), None)
                .await
        })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let confirmed = outcomes
        .iter()
        .filter(|o| matches!(o, RegistrationOutcome::Confirmed { .. }))
        .count();
    let waitlisted = outcomes
        .iter()
        .filter(|o| matches!(o, RegistrationOutcome::Waitlisted { .. }))
        .count();

    assert_eq!(confirmed, 5);
    assert_eq!(waitlisted, 35);
    assert_eq!(h.repository.count_participants(event.id, true).await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn identical_concurrent_submissions_create_one_participant() {
    let h = Harness::new();
    let event = h.event(None, None).await;

    let attempts = (0..10).map(|_| {
        let service = h.service.clone();
        let event_id = event.id;
        tokio::spawn(async move {
            service
                .register(event_id, applicant("Ann", "Eng", 2000), None)
                .await
        })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let created: Vec<_> = outcomes.iter().filter_map(RegistrationOutcome::created).collect();
    assert_eq!(created.len(), 1);

    let duplicates_point_to_it = outcomes.iter().all(|o| match o {
        RegistrationOutcome::Duplicate { existing } => existing.id == created[0].id,
        RegistrationOutcome::Confirmed { .. } => true,
        _ => false,
    });
    assert!(duplicates_point_to_it);
    assert_eq!(h.repository.count_participants(event.id, false).await.unwrap(), 1);
}

// ============================================================================
// Storage failures
// ============================================================================

/// Serves events but refuses every participant query
struct BrokenRepository {
    event: RunningEvent,
}

#[async_trait]
impl RegistrationRepository for BrokenRepository {
    async fn get_event(&self, id: EventId) -> Result<Option<RunningEvent>, StorageError> {
        Ok((id == self.event.id).then(|| self.event.clone()))
    }

    async fn list_events(&self) -> Result<Vec<RunningEvent>, StorageError> {
        Ok(vec![self.event.clone()])
    }

    async fn count_participants(&self, _: EventId, _: bool) -> Result<u32, StorageError> {
        Err(StorageError::Unavailable("connection reset".to_string()))
    }

    async fn find_participant(
        &self,
        _: EventId,
        _: &DuplicateKey,
    ) -> Result<Option<Participant>, StorageError> {
        Err(StorageError::Unavailable("connection reset".to_string()))
    }

    async fn create_participant(&self, _: NewParticipant) -> Result<Placement, StorageError> {
        panic!("must not be reached after a failed lookup");
    }

    async fn get_participant(&self, _: ParticipantId) -> Result<Option<Participant>, StorageError> {
        Ok(None)
    }

    async fn list_participants(&self, _: EventId) -> Result<Vec<Participant>, StorageError> {
        Ok(Vec::new())
    }

    async fn create_event(&self, _: NewEvent) -> Result<RunningEvent, StorageError> {
        Err(StorageError::Unavailable("read only".to_string()))
    }

    async fn delete_event(&self, _: EventId) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection reset".to_string()))
    }
}

#[tokio::test]
async fn storage_failure_aborts_the_attempt() {
    let event = RunningEvent {
        id: EventId::new(),
        name: "Firmenlauf".to_string(),
        date: date(2025, 6, 15),
        location: "Stadtpark".to_string(),
        description: String::new(),
        registration_deadline: None,
        max_participants: None,
        created_at: chrono::Utc::now(),
    };
    let service = RegistrationService::new(RegistrationEnvironment::new(
        Arc::new(clock_on(2025, 5, 1)),
        Arc::new(BrokenRepository {
            event: event.clone(),
        }),
    ));

    let err = service
        .register(event.id, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::Storage(StorageError::Unavailable("connection reset".to_string()))
    );
}

// ============================================================================
// Timeouts
// ============================================================================

/// In-memory storage with artificial latency on the lookup or the insert
struct SlowRepository {
    inner: InMemoryRegistrationRepository,
    lookup_delay: Duration,
    insert_delay: Duration,
}

#[async_trait]
impl RegistrationRepository for SlowRepository {
    async fn get_event(&self, id: EventId) -> Result<Option<RunningEvent>, StorageError> {
        self.inner.get_event(id).await
    }

    async fn list_events(&self) -> Result<Vec<RunningEvent>, StorageError> {
        self.inner.list_events().await
    }

    async fn count_participants(
        &self,
        event_id: EventId,
        excluding_waiting_list: bool,
    ) -> Result<u32, StorageError> {
        self.inner
            .count_participants(event_id, excluding_waiting_list)
            .await
    }

    async fn find_participant(
        &self,
        event_id: EventId,
        key: &DuplicateKey,
    ) -> Result<Option<Participant>, StorageError> {
        tokio::time::sleep(self.lookup_delay).await;
        self.inner.find_participant(event_id, key).await
    }

    async fn create_participant(&self, new: NewParticipant) -> Result<Placement, StorageError> {
        tokio::time::sleep(self.insert_delay).await;
        self.inner.create_participant(new).await
    }

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StorageError> {
        self.inner.get_participant(id).await
    }

    async fn list_participants(&self, event_id: EventId) -> Result<Vec<Participant>, StorageError> {
        self.inner.list_participants(event_id).await
    }

    async fn create_event(&self, new: NewEvent) -> Result<RunningEvent, StorageError> {
        self.inner.create_event(new).await
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StorageError> {
        self.inner.delete_event(id).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.inner.ping().await
    }
}

async fn slow_service(
    lookup_delay: Duration,
    insert_delay: Duration,
) -> (Arc<SlowRepository>, RegistrationService, EventId) {
    let repository = Arc::new(SlowRepository {
        inner: InMemoryRegistrationRepository::new(),
        lookup_delay,
        insert_delay,
    });
    let event = repository
        .create_event(common::new_event(None, None))
        .await
        .unwrap();
    let service = RegistrationService::new(RegistrationEnvironment::new(
        Arc::new(clock_on(2025, 5, 1)),
        Arc::clone(&repository) as Arc<dyn RegistrationRepository>,
    ))
    .with_timeout(Duration::from_millis(50));
    (repository, service, event.id)
}

#[tokio::test]
async fn timeout_during_insert_reports_the_stored_participant() {
    let (repository, service, event_id) =
        slow_service(Duration::ZERO, Duration::from_millis(300)).await;

    let outcome = service
        .register(event_id, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap();

    let RegistrationOutcome::Confirmed { participant } = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    let stored = repository.get_participant(participant.id).await.unwrap();
    assert_eq!(stored, Some(participant));
}

#[tokio::test]
async fn timeout_before_insert_stores_nothing() {
    let (repository, service, event_id) =
        slow_service(Duration::from_millis(300), Duration::ZERO).await;

    let err = service
        .register(event_id, applicant("Ann", "Eng", 1990), None)
        .await
        .unwrap_err();
    assert_eq!(err, RegistrationError::Timeout);

    // The lookup finishes late; the aborted attempt must not insert afterwards
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(repository.count_participants(event_id, false).await.unwrap(), 0);
}
