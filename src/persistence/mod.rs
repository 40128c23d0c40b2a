//! Persistence layer: durable storage of error events in PostgreSQL.
//!
//! [`ErrorStore`] is the narrow interface the orchestrators and the queue
//! worker depend on; [`postgres::PostgresErrorStore`] is the production
//! implementation backed by a shared `sqlx::PgPool`.

pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ErrorEvent, ErrorLevel, ErrorStats};
use crate::error::GatewayError;

/// Narrow interface to the durable error store.
///
/// All methods are potentially blocking I/O and honor the caller's
/// cancellation: dropping the returned future abandons the operation.
#[async_trait]
pub trait ErrorStore: Send + Sync {
    /// Persists a new error event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StorageUnavailable`] on database failure.
    async fn create_error(&self, event: &ErrorEvent) -> Result<(), GatewayError>;

    /// Returns one page of events (newest first) and the total number of
    /// events matching the filters.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StorageUnavailable`] on database failure.
    async fn get_errors(
        &self,
        limit: i64,
        offset: i64,
        level: Option<ErrorLevel>,
        source: Option<&str>,
    ) -> Result<(Vec<ErrorEvent>, i64), GatewayError>;

    /// Fetches a single event by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] when no such event exists and
    /// [`GatewayError::StorageUnavailable`] on database failure.
    async fn get_error_by_id(&self, id: Uuid) -> Result<ErrorEvent, GatewayError>;

    /// Marks an event resolved and refreshes its `updated_at`.
    ///
    /// Idempotent for existing events: re-resolving succeeds and leaves
    /// `resolved = true`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] when no such event exists and
    /// [`GatewayError::StorageUnavailable`] on database failure.
    async fn resolve_error(&self, id: Uuid) -> Result<(), GatewayError>;

    /// Permanently deletes an event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] when no such event exists and
    /// [`GatewayError::StorageUnavailable`] on database failure.
    async fn delete_error(&self, id: Uuid) -> Result<(), GatewayError>;

    /// Computes aggregate statistics over all stored events.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StorageUnavailable`] on database failure.
    async fn get_stats(&self) -> Result<ErrorStats, GatewayError>;
}
