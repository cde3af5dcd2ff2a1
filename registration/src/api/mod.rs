//! API endpoints for event registration.
//!
//! - Events: open events and event details with capacity
//! - Registrations: the registration workflow
//! - Participants: success and already-registered resources, admin listing

pub mod events;
pub mod participants;
pub mod registrations;

pub use events::{get_event, list_events};
pub use participants::{already_registered, list_participants, registration_success};
pub use registrations::register;
