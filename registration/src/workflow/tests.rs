//! Unit tests for `RegistrationReducer`.
//!
//! Effects are not executed here; each test feeds the reducer the actions its
//! effects would produce. End-to-end runs live in `tests/registration_scenarios.rs`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::*;
use crate::store::{InMemoryRegistrationRepository, Placement, StorageError};
use crate::types::{Applicant, EventId, Participant, ParticipantId, RunningEvent, TShirtSize};
use chrono::{NaiveDate, Utc};
use firmenlauf_testing::{assertions, clock_on, ReducerTest};
use std::num::NonZeroU32;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_env() -> RegistrationEnvironment {
    RegistrationEnvironment::new(
        Arc::new(clock_on(2025, 5, 1)),
        Arc::new(InMemoryRegistrationRepository::new()),
    )
}

fn event(deadline: Option<NaiveDate>, max: Option<u32>) -> RunningEvent {
    RunningEvent {
        id: EventId::new(),
        name: "Firmenlauf 2025".to_string(),
        date: date(2025, 6, 15),
        location: "Stadtpark".to_string(),
        description: String::new(),
        registration_deadline: deadline,
        max_participants: max.and_then(NonZeroU32::new),
        created_at: Utc::now(),
    }
}

fn applicant() -> Applicant {
    Applicant {
        name: Some("Ann".to_string()),
        department: Some("Eng".to_string()),
        year_of_birth: Some(2000.into()),
        tshirt_size: Some("M".to_string()),
        email: Some("ann@example.com".to_string()),
    }
}

fn participant(event_id: EventId, on_waiting_list: bool) -> Participant {
    Participant {
        id: ParticipantId::new(),
        event_id,
        name: "Ann".to_string(),
        department: "Eng".to_string(),
        year_of_birth: 2000,
        tshirt_size: TShirtSize::M,
        email: "ann@example.com".to_string(),
        on_waiting_list,
        registered_at: Utc::now(),
    }
}

fn submit(event_id: EventId) -> RegistrationAction {
    RegistrationAction::Submit {
        event_id,
        applicant: applicant(),
        today: None,
    }
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_submit_loads_event_with_clock_date() {
    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_action(submit(EventId::new()))
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Received);
            assert_eq!(state.today, Some(date(2025, 5, 1)));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn test_explicit_date_overrides_clock() {
    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_action(RegistrationAction::Submit {
            event_id: EventId::new(),
            applicant: applicant(),
            today: Some(date(2030, 1, 1)),
        })
        .then_state(|state| assert_eq!(state.today, Some(date(2030, 1, 1))))
        .run();
}

#[test]
fn test_resubmission_is_ignored() {
    let event_id = EventId::new();
    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([submit(event_id), submit(EventId::new())])
        .then_state(move |state| assert_eq!(state.event_id, Some(event_id)))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_unknown_event_fails() {
    let event_id = EventId::new();
    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([submit(event_id), RegistrationAction::EventMissing])
        .then_state(move |state| {
            assert_eq!(state.phase, Phase::Failed);
            assert_eq!(state.error, Some(RegistrationError::EventNotFound(event_id)));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

// ============================================================================
// Rule order
// ============================================================================

#[test]
fn test_closed_event_skips_validation() {
    let closed = event(Some(date(2025, 4, 30)), None);
    let event_id = closed.id;
    let mut broken = applicant();
    broken.email = None;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            RegistrationAction::Submit {
                event_id,
                applicant: broken,
                today: None,
            },
            RegistrationAction::EventLoaded { event: closed },
        ])
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Completed);
            assert_eq!(state.outcome, Some(RegistrationOutcome::Closed));
            assert!(state.valid.is_none());
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn test_deadline_day_is_still_open() {
    let open = event(Some(date(2025, 5, 1)), None);
    let event_id = open.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([submit(event_id), RegistrationAction::EventLoaded { event: open }])
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Validating);
            assert!(state.valid.is_some());
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn test_invalid_fields_are_reported() {
    let open = event(None, None);
    let event_id = open.id;
    let mut bad = applicant();
    bad.email = Some("not-an-email".to_string());
    bad.year_of_birth = Some(1850.into());

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            RegistrationAction::Submit {
                event_id,
                applicant: bad,
                today: None,
            },
            RegistrationAction::EventLoaded { event: open },
        ])
        .then_state(|state| {
            let Some(RegistrationOutcome::Invalid { errors }) = &state.outcome else {
                panic!("expected invalid outcome, got {:?}", state.outcome);
            };
            let fields: Vec<_> = errors.fields().collect();
            assert_eq!(fields, vec!["email", "year_of_birth"]);
        })
        .run();
}

#[test]
fn test_configured_birth_years_apply() {
    let open = event(None, None);
    let event_id = open.id;
    let env = test_env().with_config(crate::config::RegistrationConfig {
        birth_years: crate::config::BirthYearRange { min: 2001, max: 2010 },
    });

    ReducerTest::new(RegistrationReducer::new())
        .with_env(env)
        .given_state(RegistrationState::default())
        .when_actions([submit(event_id), RegistrationAction::EventLoaded { event: open }])
        .then_state(|state| {
            assert!(matches!(
                state.outcome,
                Some(RegistrationOutcome::Invalid { .. })
            ));
        })
        .run();
}

#[test]
fn test_duplicate_hit_completes_with_existing() {
    let open = event(None, None);
    let event_id = open.id;
    let existing = participant(event_id, false);
    let expected = existing.clone();

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: open },
            RegistrationAction::DuplicateChecked {
                existing: Some(existing),
            },
        ])
        .then_state(move |state| {
            assert_eq!(
                state.outcome,
                Some(RegistrationOutcome::Duplicate { existing: expected })
            );
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_future_effect(effects);
        })
        .run();
}

#[test]
fn test_unlimited_event_stores_without_counting() {
    let open = event(None, None);
    let event_id = open.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: open },
            RegistrationAction::DuplicateChecked { existing: None },
        ])
        .then_state(|state| assert_eq!(state.phase, Phase::Storing))
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn test_limited_event_counts_before_storing() {
    let limited = event(None, Some(2));
    let event_id = limited.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: limited },
            RegistrationAction::DuplicateChecked { existing: None },
        ])
        .then_state(|state| assert_eq!(state.phase, Phase::Validating))
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn test_full_event_moves_to_storing() {
    let limited = event(None, Some(2));
    let event_id = limited.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: limited },
            RegistrationAction::DuplicateChecked { existing: None },
            RegistrationAction::SpotsChecked { available: false },
        ])
        .then_state(|state| assert_eq!(state.phase, Phase::Storing))
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

// ============================================================================
// Storage results
// ============================================================================

fn stored(placement: Placement, event: RunningEvent) -> Vec<RegistrationAction> {
    let event_id = event.id;
    vec![
        submit(event_id),
        RegistrationAction::EventLoaded { event },
        RegistrationAction::DuplicateChecked { existing: None },
        RegistrationAction::ParticipantStored { placement },
    ]
}

#[test]
fn test_created_participant_is_confirmed() {
    let open = event(None, None);
    let created = participant(open.id, false);
    let expected = created.clone();

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions(stored(Placement::Created(created), open))
        .then_state(move |state| {
            assert_eq!(state.phase, Phase::Completed);
            assert_eq!(
                state.outcome,
                Some(RegistrationOutcome::Confirmed { participant: expected })
            );
        })
        .run();
}

#[test]
fn test_waiting_list_flag_yields_waitlisted() {
    let open = event(None, None);
    let created = participant(open.id, true);

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions(stored(Placement::Created(created), open))
        .then_state(|state| {
            assert!(matches!(
                state.outcome,
                Some(RegistrationOutcome::Waitlisted { .. })
            ));
        })
        .run();
}

#[test]
fn test_duplicate_found_at_insert_is_reported() {
    let open = event(None, None);
    let existing = participant(open.id, false);

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions(stored(Placement::Duplicate(existing), open))
        .then_state(|state| {
            assert!(matches!(
                state.outcome,
                Some(RegistrationOutcome::Duplicate { .. })
            ));
        })
        .run();
}

#[test]
fn test_storage_failure_aborts() {
    let open = event(None, None);
    let event_id = open.id;
    let error = StorageError::Unavailable("connection refused".to_string());

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: open },
            RegistrationAction::StorageFailed {
                error: error.clone(),
            },
        ])
        .then_state(move |state| {
            assert_eq!(state.phase, Phase::Failed);
            assert_eq!(state.error, Some(RegistrationError::Storage(error)));
            assert!(state.outcome.is_none());
        })
        .run();
}

#[test]
fn test_event_deleted_before_insert_is_not_found() {
    let open = event(None, None);
    let event_id = open.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: open },
            RegistrationAction::DuplicateChecked { existing: None },
            RegistrationAction::StorageFailed {
                error: StorageError::EventNotFound(event_id),
            },
        ])
        .then_state(move |state| {
            assert_eq!(state.error, Some(RegistrationError::EventNotFound(event_id)));
        })
        .run();
}

#[test]
fn test_expiry_before_insert_aborts_and_ignores_late_results() {
    let limited = event(None, Some(2));
    let event_id = limited.id;

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: limited },
            RegistrationAction::DuplicateChecked { existing: None },
            RegistrationAction::Expired,
            RegistrationAction::SpotsChecked { available: true },
        ])
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Failed);
            assert_eq!(state.error, Some(RegistrationError::Timeout));
            assert!(state.outcome.is_none());
        })
        .run();
}

#[test]
fn test_expiry_during_insert_waits_for_it() {
    let open = event(None, None);
    let event_id = open.id;
    let created = participant(event_id, false);

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_actions([
            submit(event_id),
            RegistrationAction::EventLoaded { event: open },
            RegistrationAction::DuplicateChecked { existing: None },
            RegistrationAction::Expired,
            RegistrationAction::ParticipantStored {
                placement: Placement::Created(created),
            },
        ])
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Completed);
            assert!(matches!(
                state.outcome,
                Some(RegistrationOutcome::Confirmed { .. })
            ));
        })
        .run();
}

#[test]
fn test_out_of_order_result_is_ignored() {
    let open = event(None, None);

    ReducerTest::new(RegistrationReducer::new())
        .with_env(test_env())
        .given_state(RegistrationState::default())
        .when_action(RegistrationAction::EventLoaded { event: open })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Idle);
            assert!(state.event.is_none());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_outcome_serializes_with_tag() {
    let json = serde_json::to_value(RegistrationOutcome::Closed).unwrap();
    assert_eq!(json, serde_json::json!({ "outcome": "REJECTED_CLOSED" }));

    let participant = participant(EventId::new(), true);
    let json = serde_json::to_value(RegistrationOutcome::Waitlisted { participant }).unwrap();
    assert_eq!(json["outcome"], "ACCEPTED_WAITLISTED");
    assert_eq!(json["participant"]["on_waiting_list"], true);
}
