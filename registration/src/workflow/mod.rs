//! Registration workflow.
//!
//! One attempt is a small state machine driven by [`RegistrationReducer`]:
//!
//! ```text
//! Submit ──► load event ──► closed? ──────────────► REJECTED_CLOSED
//!                │
//!                ▼
//!            validate ──── errors ────────────────► REJECTED_INVALID
//!                │
//!                ▼
//!         find duplicate ── hit ──────────────────► REJECTED_DUPLICATE
//!                │
//!                ▼
//!       count confirmed (limited events only)
//!                │
//!                ▼
//!       create participant ── waiting list ───────► ACCEPTED_WAITLISTED
//!                └───────────────────────────────► ACCEPTED_CONFIRMED
//! ```
//!
//! The insert re-checks duplicate key and capacity atomically, so its
//! [`Placement`](crate::store::Placement) has the final word on the outcome.
//! [`RegistrationService`] runs one attempt per call and waits for the
//! terminal action.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod service;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::RegistrationAction;
pub use environment::RegistrationEnvironment;
pub use reducer::RegistrationReducer;
pub use service::RegistrationService;
pub use types::{Phase, RegistrationError, RegistrationOutcome, RegistrationState};
