//! Registration eligibility: open window, capacity and duplicate lookup.
//!
//! The checks on [`RunningEvent`] are pure and take the date and the confirmed
//! count as parameters. The free functions read the current counts from a
//! [`RegistrationRepository`] on every call.

use crate::store::{RegistrationRepository, StorageError};
use crate::types::{DuplicateKey, EventId, Participant, RunningEvent};
use chrono::NaiveDate;
use serde::Serialize;

impl RunningEvent {
    /// False iff a deadline is set and `as_of` lies after it.
    #[must_use]
    pub fn is_registration_open(&self, as_of: NaiveDate) -> bool {
        self.registration_deadline
            .map_or(true, |deadline| as_of <= deadline)
    }

    /// Remaining confirmed spots given the number of confirmed participants.
    ///
    /// `None` means unlimited. Never underflows when the event is overbooked.
    #[must_use]
    pub fn available_spots(&self, confirmed: u32) -> Option<u32> {
        self.max_participants
            .map(|max| max.get().saturating_sub(confirmed))
    }

    /// Unlimited, or at least one spot left.
    #[must_use]
    pub fn has_available_spots(&self, confirmed: u32) -> bool {
        self.available_spots(confirmed).map_or(true, |spots| spots > 0)
    }
}

/// Snapshot of an event's capacity, as shown to applicants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Participants not on the waiting list
    pub confirmed: u32,
    /// Participants on the waiting list
    pub waiting_list: u32,
    /// Remaining spots, `None` if unlimited
    pub available_spots: Option<u32>,
    /// Whether registration is accepted on the reference date
    pub registration_open: bool,
}

/// Remaining spots of `event`, counted from persisted state.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn available_spots(
    repository: &dyn RegistrationRepository,
    event: &RunningEvent,
) -> Result<Option<u32>, StorageError> {
    if event.max_participants.is_none() {
        return Ok(None);
    }
    let confirmed = repository.count_participants(event.id, true).await?;
    Ok(event.available_spots(confirmed))
}

/// Whether `event` can take another confirmed participant.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn has_available_spots(
    repository: &dyn RegistrationRepository,
    event: &RunningEvent,
) -> Result<bool, StorageError> {
    Ok(available_spots(repository, event)
        .await?
        .map_or(true, |spots| spots > 0))
}

/// Exact, case-sensitive match of the duplicate key within `event_id`.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn find_duplicate(
    repository: &dyn RegistrationRepository,
    event_id: EventId,
    key: &DuplicateKey,
) -> Result<Option<Participant>, StorageError> {
    repository.find_participant(event_id, key).await
}

/// Capacity and open state of `event` as of `today`.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn availability(
    repository: &dyn RegistrationRepository,
    event: &RunningEvent,
    today: NaiveDate,
) -> Result<Availability, StorageError> {
    let confirmed = repository.count_participants(event.id, true).await?;
    let total = repository.count_participants(event.id, false).await?;

    Ok(Availability {
        confirmed,
        waiting_list: total.saturating_sub(confirmed),
        available_spots: event.available_spots(confirmed),
        registration_open: event.is_registration_open(today),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryRegistrationRepository;
    use crate::types::{EventId, ParticipantId, TShirtSize};
    use chrono::Utc;
    use std::num::NonZeroU32;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(deadline: Option<NaiveDate>, max: Option<u32>) -> RunningEvent {
        RunningEvent {
            id: EventId::new(),
            name: "Firmenlauf".to_string(),
            date: date(2025, 6, 15),
            location: "Stadtpark".to_string(),
            description: String::new(),
            registration_deadline: deadline,
            max_participants: max.and_then(NonZeroU32::new),
            created_at: Utc::now(),
        }
    }

    fn participant(event_id: EventId, name: &str, on_waiting_list: bool) -> Participant {
        Participant {
            id: ParticipantId::new(),
            event_id,
            name: name.to_string(),
            department: "Eng".to_string(),
            year_of_birth: 1990,
            tshirt_size: TShirtSize::L,
            email: "runner@example.com".to_string(),
            on_waiting_list,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn deadline_day_itself_is_open() {
        let e = event(Some(date(2025, 5, 31)), None);
        assert!(e.is_registration_open(date(2025, 5, 30)));
        assert!(e.is_registration_open(date(2025, 5, 31)));
        assert!(!e.is_registration_open(date(2025, 6, 1)));
    }

    #[test]
    fn no_deadline_is_always_open() {
        let e = event(None, None);
        assert!(e.is_registration_open(date(1970, 1, 1)));
        assert!(e.is_registration_open(date(2999, 12, 31)));
    }

    #[test]
    fn overbooked_event_reports_zero_spots() {
        let e = event(None, Some(2));
        assert_eq!(e.available_spots(0), Some(2));
        assert_eq!(e.available_spots(2), Some(0));
        assert_eq!(e.available_spots(5), Some(0));
        assert!(!e.has_available_spots(2));
    }

    #[test]
    fn unlimited_event_always_has_spots() {
        let e = event(None, None);
        assert_eq!(e.available_spots(10_000), None);
        assert!(e.has_available_spots(u32::MAX));
    }

    #[tokio::test]
    async fn waiting_list_does_not_consume_spots() {
        let repo = InMemoryRegistrationRepository::new();
        let e = event(None, Some(2));
        repo.insert_event(e.clone()).await;
        repo.insert_participant(participant(e.id, "Ann", false)).await;
        repo.insert_participant(participant(e.id, "Bob", true)).await;

        assert_eq!(available_spots(&repo, &e).await.unwrap(), Some(1));
        assert!(has_available_spots(&repo, &e).await.unwrap());

        let summary = availability(&repo, &e, date(2025, 1, 1)).await.unwrap();
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.waiting_list, 1);
        assert!(summary.registration_open);
    }

    #[tokio::test]
    async fn duplicate_lookup_is_case_sensitive_and_scoped() {
        let repo = InMemoryRegistrationRepository::new();
        let e = event(None, None);
        let other = event(None, None);
        repo.insert_event(e.clone()).await;
        repo.insert_event(other.clone()).await;
        let ann = participant(e.id, "Ann", false);
        repo.insert_participant(ann.clone()).await;

        let key = ann.duplicate_key();
        assert_eq!(find_duplicate(&repo, e.id, &key).await.unwrap(), Some(ann));
        assert!(find_duplicate(&repo, other.id, &key).await.unwrap().is_none());

        let lower = DuplicateKey {
            name: "ann".to_string(),
            ..key
        };
        assert!(find_duplicate(&repo, e.id, &lower).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_reads_do_not_change_the_answer() {
        let repo = InMemoryRegistrationRepository::new();
        let e = event(Some(date(2025, 5, 31)), Some(3));
        repo.insert_event(e.clone()).await;
        repo.insert_participant(participant(e.id, "Ann", false)).await;
        repo.insert_participant(participant(e.id, "Bob", true)).await;
        let today = date(2025, 5, 1);

        let spots = available_spots(&repo, &e).await.unwrap();
        let summary = availability(&repo, &e, today).await.unwrap();
        for _ in 0..5 {
            assert_eq!(available_spots(&repo, &e).await.unwrap(), spots);
            assert!(has_available_spots(&repo, &e).await.unwrap());
            assert_eq!(availability(&repo, &e, today).await.unwrap(), summary);
        }

        assert_eq!(spots, Some(2));
        assert_eq!(repo.count_participants(e.id, false).await.unwrap(), 2);
    }
}
