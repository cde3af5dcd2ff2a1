//! Application state for the registration HTTP server.

use crate::store::RegistrationRepository;
use crate::workflow::{RegistrationEnvironment, RegistrationService};
use firmenlauf_core::environment::Clock;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Read access for listings and detail resources
    pub repository: Arc<dyn RegistrationRepository>,
    /// Runs registration attempts
    pub registrations: RegistrationService,
    /// Reference date for open/closed listings
    pub clock: Arc<dyn Clock>,
    /// Contact shown on the already-registered resource
    pub admin_email: Arc<str>,
}

impl AppState {
    /// Build the state from the workflow environment so that handlers and the
    /// workflow share one repository and clock.
    #[must_use]
    pub fn new(environment: RegistrationEnvironment) -> Self {
        Self {
            repository: Arc::clone(&environment.repository),
            clock: Arc::clone(&environment.clock),
            admin_email: Arc::from(environment.admin_email.as_str()),
            registrations: RegistrationService::new(environment),
        }
    }
}
