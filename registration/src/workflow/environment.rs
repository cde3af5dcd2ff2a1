//! Dependencies of the registration reducer.

use crate::config::RegistrationConfig;
use crate::notify::Notifier;
use crate::store::RegistrationRepository;
use firmenlauf_core::environment::Clock;
use std::sync::Arc;

/// Injected collaborators for the registration workflow.
///
/// Production uses `SystemClock` and the configured repository; tests swap in
/// `FixedClock` and the in-memory repository.
#[derive(Clone)]
pub struct RegistrationEnvironment {
    /// Source of "today" and registration timestamps
    pub clock: Arc<dyn Clock>,
    /// Event and participant storage
    pub repository: Arc<dyn RegistrationRepository>,
    /// Receives duplicate notices; `None` disables them
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Recipient of duplicate notices
    pub admin_email: String,
    /// Validation rules
    pub config: RegistrationConfig,
}

impl RegistrationEnvironment {
    /// Environment without notifications and with default rules
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, repository: Arc<dyn RegistrationRepository>) -> Self {
        Self {
            clock,
            repository,
            notifier: None,
            admin_email: String::new(),
            config: RegistrationConfig::default(),
        }
    }

    /// Send duplicate notices to `admin_email` through `notifier`
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, admin_email: impl Into<String>) -> Self {
        self.notifier = Some(notifier);
        self.admin_email = admin_email.into();
        self
    }

    /// Replace the validation rules
    #[must_use]
    pub fn with_config(mut self, config: RegistrationConfig) -> Self {
        self.config = config;
        self
    }
}
