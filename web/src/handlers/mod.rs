//! HTTP request handlers shared by services.

pub mod health;

pub use health::{ComponentHealth, HealthReport, HealthStatus, health_check, readiness_response};
