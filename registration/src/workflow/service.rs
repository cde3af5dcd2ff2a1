//! Entry point running one attempt per call.

use super::actions::RegistrationAction;
use super::environment::RegistrationEnvironment;
use super::reducer::RegistrationReducer;
use super::types::{Phase, RegistrationError, RegistrationOutcome, RegistrationState};
use crate::types::{Applicant, EventId};
use chrono::NaiveDate;
use firmenlauf_runtime::{Store, StoreError};
use std::time::{Duration, Instant};

/// Default upper bound for one attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

type RegistrationStore =
    Store<RegistrationState, RegistrationAction, RegistrationEnvironment, RegistrationReducer>;

/// Runs registration attempts.
///
/// Every call gets its own [`Store`]; attempts share only the repository in
/// the environment, which serializes the final insert per event.
#[derive(Clone)]
pub struct RegistrationService {
    environment: RegistrationEnvironment,
    timeout: Duration,
}

impl RegistrationService {
    /// Create a service over `environment`.
    #[must_use]
    pub const fn new(environment: RegistrationEnvironment) -> Self {
        Self {
            environment,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The injected collaborators.
    #[must_use]
    pub const fn environment(&self) -> &RegistrationEnvironment {
        &self.environment
    }

    /// Decide one attempt.
    ///
    /// `today` overrides the environment clock for the deadline check.
    ///
    /// The timeout only applies before the participant is written. If the
    /// insert is already running when it expires, the call waits for the
    /// insert and reports its real outcome.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`]: unknown event
    /// - [`RegistrationError::Storage`]: storage failed; nothing was decided
    /// - [`RegistrationError::Timeout`]: the attempt did not reach the insert
    ///   in time; nothing was stored
    #[tracing::instrument(skip(self, applicant), fields(event_id = %event_id))]
    pub async fn register(
        &self,
        event_id: EventId,
        applicant: Applicant,
        today: Option<NaiveDate>,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let started = Instant::now();
        let store: RegistrationStore = Store::new(
            RegistrationState::default(),
            RegistrationReducer::new(),
            self.environment.clone(),
        );

        let result = store
            .send_and_wait_for(
                RegistrationAction::Submit {
                    event_id,
                    applicant,
                    today,
                },
                RegistrationAction::is_terminal,
                self.timeout,
            )
            .await;

        let result = match result {
            Ok(RegistrationAction::Completed { outcome }) => Ok(outcome),
            Ok(RegistrationAction::Failed { error }) => Err(error),
            Ok(other) => Err(RegistrationError::Runtime(format!(
                "unexpected terminal action: {other:?}"
            ))),
            Err(StoreError::Timeout) => settle(&store).await,
            Err(e) => Err(RegistrationError::Runtime(e.to_string())),
        };

        let label = match &result {
            Ok(outcome) => {
                tracing::info!(outcome = outcome.as_str(), "Registration attempt finished");
                outcome.as_str()
            },
            Err(error) => {
                tracing::warn!(%error, "Registration attempt failed");
                "error"
            },
        };
        crate::metrics::record_attempt(label, started.elapsed());

        result
    }
}

/// Resolve an attempt whose caller timed out.
///
/// Attempts that have not started the insert are aborted. A running insert
/// is awaited so a stored participant is never reported as a timeout.
async fn settle(store: &RegistrationStore) -> Result<RegistrationOutcome, RegistrationError> {
    store
        .send(RegistrationAction::Expired)
        .await
        .map_err(|e| RegistrationError::Runtime(e.to_string()))?;

    loop {
        let settled = store
            .state(|s| match s.phase {
                Phase::Completed => Some(s.outcome.clone().ok_or_else(|| {
                    RegistrationError::Runtime("completed without an outcome".to_string())
                })),
                Phase::Failed => Some(Err(s.error.clone().unwrap_or(RegistrationError::Timeout))),
                _ => None,
            })
            .await;

        if let Some(result) = settled {
            return result;
        }
        tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
    }
}
