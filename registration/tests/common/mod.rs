//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)] // Not every test uses every helper

use async_trait::async_trait;
use chrono::NaiveDate;
use firmenlauf_registration::notify::{DuplicateRegistration, Notifier, NotifyError};
use firmenlauf_registration::store::{InMemoryRegistrationRepository, RegistrationRepository};
use firmenlauf_registration::types::{Applicant, NewEvent, RunningEvent};
use firmenlauf_registration::workflow::{RegistrationEnvironment, RegistrationService};
use firmenlauf_testing::clock_on;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn new_event(deadline: Option<NaiveDate>, max: Option<u32>) -> NewEvent {
    NewEvent {
        name: "Firmenlauf 2025".to_string(),
        date: date(2025, 6, 15),
        location: "Stadtpark".to_string(),
        description: "5 km company run".to_string(),
        registration_deadline: deadline,
        max_participants: max.map(|m| NonZeroU32::new(m).expect("positive limit")),
    }
}

pub fn applicant(name: &str, department: &str, year: i32) -> Applicant {
    Applicant {
        name: Some(name.to_string()),
        department: Some(department.to_string()),
        year_of_birth: Some(year.into()),
        tshirt_size: Some("M".to_string()),
        email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
    }
}

/// Notifier remembering every notice
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(String, DuplicateRegistration)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn duplicate_registration(
        &self,
        admin_email: &str,
        notice: &DuplicateRegistration,
    ) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .await
            .push((admin_email.to_string(), notice.clone()));
        Ok(())
    }
}

/// In-memory setup with the clock on 2025-05-01
pub struct Harness {
    pub repository: Arc<InMemoryRegistrationRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: RegistrationService,
}

impl Harness {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryRegistrationRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let environment = RegistrationEnvironment::new(
            Arc::new(clock_on(2025, 5, 1)),
            Arc::clone(&repository) as Arc<dyn RegistrationRepository>,
        )
        .with_notifier(
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            "admin@example.com",
        );

        Self {
            repository,
            notifier,
            service: RegistrationService::new(environment),
        }
    }

    pub async fn event(&self, deadline: Option<NaiveDate>, max: Option<u32>) -> RunningEvent {
        self.repository
            .create_event(new_event(deadline, max))
            .await
            .unwrap()
    }
}
