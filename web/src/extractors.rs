//! Custom Axum extractors.

use crate::middleware::{CORRELATION_ID_HEADER, correlation_id_from};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Uses the id stored by [`correlation_id_layer`](crate::correlation_id_layer)
/// when the middleware is installed, otherwise the `x-correlation-id` header,
/// otherwise a fresh UUID v4.
///
/// ```ignore
/// async fn handler(correlation_id: CorrelationId) -> String {
///     format!("Request ID: {}", correlation_id.0)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = match parts.extensions.get::<Uuid>() {
            Some(id) => *id,
            None => correlation_id_from(parts.headers.get(CORRELATION_ID_HEADER)),
        };
        Ok(Self(id))
    }
}
