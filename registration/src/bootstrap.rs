//! Infrastructure setup from configuration.
//!
//! ```rust,ignore
//! let config = Config::from_env()?;
//! let resources = Resources::from_config(&config).await?;
//! let app = build_router(AppState::new(resources.environment(&config)));
//! ```

use crate::config::{Config, StorageBackend};
use crate::notify::{LogNotifier, Notifier, SmtpNotifier};
use crate::store::{
    InMemoryRegistrationRepository, PostgresRegistrationRepository, RegistrationRepository,
    StorageError,
};
use crate::types::{NewEvent, RunningEvent};
use crate::workflow::RegistrationEnvironment;
use anyhow::Context;
use chrono::{Duration, NaiveDate};
use firmenlauf_core::environment::{Clock, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::info;

/// Create the event an in-memory development server starts with.
///
/// Registration stays open for four weeks from `today`; the run is two
/// weeks later, with room for 100 confirmed participants.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn seed_sample_event(
    repository: &dyn RegistrationRepository,
    today: NaiveDate,
) -> Result<RunningEvent, StorageError> {
    let deadline = today + Duration::weeks(4);
    repository
        .create_event(NewEvent {
            name: "Firmenlauf (sample)".to_string(),
            date: deadline + Duration::weeks(2),
            location: "Stadtpark".to_string(),
            description: "Sample event for local development".to_string(),
            registration_deadline: Some(deadline),
            max_participants: NonZeroU32::new(100),
        })
        .await
}

/// Shared infrastructure for the server.
#[derive(Clone)]
pub struct Resources {
    /// System clock
    pub clock: Arc<dyn Clock>,
    /// Configured repository
    pub repository: Arc<dyn RegistrationRepository>,
    /// Configured notifier
    pub notifier: Arc<dyn Notifier>,
}

impl Resources {
    /// Connect storage (running migrations) and set up mail delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable, a migration fails, or
    /// the SMTP relay is unusable.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let repository: Arc<dyn RegistrationRepository> = match config.storage {
            StorageBackend::Postgres => {
                info!("Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new()
                    .max_connections(config.postgres.max_connections)
                    .connect(&config.postgres.url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;

                let repository = PostgresRegistrationRepository::new(Arc::new(pool));
                info!("Running migrations...");
                repository.migrate().await?;
                info!("Database ready");
                Arc::new(repository)
            },
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                let repository = InMemoryRegistrationRepository::new();
                let event = seed_sample_event(&repository, clock.today())
                    .await
                    .context("Failed to seed the sample event")?;
                info!(event_id = %event.id, "Seeded sample event");
                Arc::new(repository)
            },
        };

        let notifier: Arc<dyn Notifier> = match &config.notification.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "Sending notices via SMTP");
                Arc::new(SmtpNotifier::new(smtp)?)
            },
            None => {
                info!("No SMTP relay configured, logging notices");
                Arc::new(LogNotifier)
            },
        };

        Ok(Self {
            clock,
            repository,
            notifier,
        })
    }

    /// Workflow environment wired to these resources.
    #[must_use]
    pub fn environment(&self, config: &Config) -> RegistrationEnvironment {
        RegistrationEnvironment::new(Arc::clone(&self.clock), Arc::clone(&self.repository))
            .with_notifier(Arc::clone(&self.notifier), config.notification.admin_email.clone())
            .with_config(config.registration.clone())
    }
}
