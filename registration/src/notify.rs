//! Administrator notifications.
//!
//! The workflow reports rejected duplicate registrations so the administrator
//! can follow up (the applicant is told to contact them). Delivery is
//! best-effort: failures are logged and never change the registration outcome.

use crate::config::SmtpConfig;
use crate::types::{DuplicateKey, EventId, ParticipantId};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Notification delivery failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Message could not be built (bad address)
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Transport failed
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A registration was rejected because the person is already registered
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateRegistration {
    /// Event the attempt was for
    pub event_id: EventId,
    /// Event name, for the message subject
    pub event_name: String,
    /// The rejected applicant's duplicate key
    pub applicant: DuplicateKey,
    /// Email given in the rejected attempt
    pub applicant_email: String,
    /// The registration that already exists
    pub existing_participant_id: ParticipantId,
}

impl DuplicateRegistration {
    fn subject(&self) -> String {
        format!("Duplicate registration attempt for {}", self.event_name)
    }

    fn body(&self) -> String {
        format!(
            "A registration for {event} was rejected as a duplicate.\n\n\
             Name: {name}\nDepartment: {department}\nYear of birth: {year}\n\
             Email given: {email}\nExisting registration: {existing}\n",
            event = self.event_name,
            name = self.applicant.name,
            department = self.applicant.department,
            year = self.applicant.year_of_birth,
            email = self.applicant_email,
            existing = self.existing_participant_id,
        )
    }
}

/// Delivers administrator notices
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell `admin_email` about a rejected duplicate registration
    async fn duplicate_registration(
        &self,
        admin_email: &str,
        notice: &DuplicateRegistration,
    ) -> Result<(), NotifyError>;
}

/// Writes notices to the log instead of sending mail
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn duplicate_registration(
        &self,
        admin_email: &str,
        notice: &DuplicateRegistration,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            to = %admin_email,
            event_id = %notice.event_id,
            existing_participant_id = %notice.existing_participant_id,
            subject = %notice.subject(),
            "Duplicate registration notice"
        );
        Ok(())
    }
}

/// Sends notices through an SMTP relay (STARTTLS)
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpNotifier {
    /// Build the transport from configuration. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Delivery`] if the relay host is unusable.
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Delivery(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn duplicate_registration(
        &self,
        admin_email: &str,
        notice: &DuplicateRegistration,
    ) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e| NotifyError::InvalidMessage(format!("Invalid from address: {e}")))?,
            )
            .to(admin_email
                .parse()
                .map_err(|e| NotifyError::InvalidMessage(format!("Invalid to address: {e}")))?)
            .subject(notice.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body())
            .map_err(|e| NotifyError::InvalidMessage(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(format!("Failed to send email: {e}")))?;

        tracing::debug!(to = %admin_email, "Duplicate registration notice sent");
        Ok(())
    }
}
