//! Axum integration for the Firmenlauf registration service.
//!
//! The HTTP layer is the imperative shell around the registration workflow:
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (path, JSON body, correlation id)
//! 3. **Run the workflow** through a `Store`
//! 4. **Map the outcome** to an HTTP response
//!
//! This crate holds the pieces that do not depend on the registration domain:
//! the [`AppError`] response type, correlation-id tracking and health handlers.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
