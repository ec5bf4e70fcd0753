//! The remote calendar service as seen by the reconciler.
//!
//! Implementations live in provider crates (e.g. `icalsync-provider-google`).
//! Remote events come back already reduced to [`NormalizedEvent`], cancelled
//! ones included.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::NormalizedEvent;

/// Failures a remote call can report. Only `RateLimited` is retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),
}

#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    /// Every event on the calendar, including cancelled ones.
    async fn list_all_events(&self, calendar_id: &str)
    -> Result<Vec<NormalizedEvent>, RemoteError>;

    /// Insert `event` under its own id. Returns the stored event.
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> Result<NormalizedEvent, RemoteError>;

    /// Replace the event stored under `id` with `event`.
    async fn update_event(
        &self,
        calendar_id: &str,
        id: &str,
        event: &NormalizedEvent,
    ) -> Result<NormalizedEvent, RemoteError>;

    /// Mark the event as cancelled. The service keeps it around as a cancelled entry.
    async fn delete_event(&self, calendar_id: &str, id: &str) -> Result<(), RemoteError>;
}
