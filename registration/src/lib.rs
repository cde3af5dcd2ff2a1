//! Firmenlauf registration: sign-up for company running events.
//!
//! Organizers publish running events with an optional registration deadline
//! and an optional participant limit. Participants register through a JSON
//! API. Once an event is full, new registrations land on a waiting list; a
//! second registration of the same person (name, department, year of birth)
//! for the same event is rejected and points to the existing one.
//!
//! # Architecture
//!
//! ```text
//!  HTTP (axum) ──► RegistrationService ──► Store<RegistrationReducer>
//!                                                │ effects
//!                                                ▼
//!                                   RegistrationRepository
//!                                   ├─ InMemoryRegistrationRepository
//!                                   └─ PostgresRegistrationRepository
//! ```
//!
//! - [`eligibility`]: open window, spots, duplicate lookup
//! - [`validation`]: form field rules
//! - [`workflow`]: the per-attempt state machine
//! - [`store`]: persistence with an atomic, race-free insert
//! - [`api`] and [`server`]: the HTTP surface
//! - [`notify`]: administrator notices about duplicates

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod eligibility;
pub mod metrics;
pub mod notify;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;
pub mod workflow;

pub use config::Config;
pub use store::{Placement, RegistrationRepository, StorageError};
pub use types::{
    Applicant, EventId, NewEvent, Participant, ParticipantId, RunningEvent, TShirtSize,
};
pub use workflow::{RegistrationOutcome, RegistrationService};
