//! Cache layer: Redis-backed work queue, recent-items ring, and keyed
//! TTL caches for list and stats reads.
//!
//! [`CacheStore`] is the narrow interface consumed by the orchestrators and
//! the queue worker. The production implementation lives in
//! [`redis::RedisCache`]; reads degrade gracefully when the cache is down
//! (a cache error is treated as a miss by the callers).

pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ErrorEvent, ErrorStats};
use crate::error::GatewayError;

/// Narrow interface to the cache/queue backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Pushes an event onto the durable-write work queue and the bounded
    /// recent-items ring.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] when the backend is
    /// unreachable; the caller falls back to a synchronous store write.
    async fn enqueue(&self, event: &ErrorEvent) -> Result<(), GatewayError>;

    /// Pops the oldest queued event, blocking up to `timeout`.
    ///
    /// Returns `Ok(None)` when the wait times out with an empty queue, so a
    /// consumer loop can observe shutdown between items.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure or an
    /// undecodable queue entry.
    async fn dequeue_blocking(
        &self,
        timeout: Duration,
    ) -> Result<Option<ErrorEvent>, GatewayError>;

    /// Returns up to `limit` most recently enqueued events from the ring.
    ///
    /// Entries that fail to decode are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure.
    async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorEvent>, GatewayError>;

    /// Caches one page of list results under `key` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure.
    async fn cache_list(
        &self,
        key: &str,
        events: &[ErrorEvent],
        ttl: Duration,
    ) -> Result<(), GatewayError>;

    /// Looks up a cached list page. `Ok(None)` is a miss.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure or an
    /// undecodable entry.
    async fn cached_list(&self, key: &str) -> Result<Option<Vec<ErrorEvent>>, GatewayError>;

    /// Caches the aggregate statistics (fixed TTL chosen by the backend).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure.
    async fn cache_stats(&self, stats: &ErrorStats) -> Result<(), GatewayError>;

    /// Looks up cached statistics. `Ok(None)` is a miss.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure or an
    /// undecodable entry.
    async fn cached_stats(&self) -> Result<Option<ErrorStats>, GatewayError>;

    /// Drops every cached list page and the cached statistics.
    ///
    /// Called after every mutation; callers log failures and continue since
    /// staleness is bounded by TTL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] on backend failure.
    async fn invalidate_all(&self) -> Result<(), GatewayError>;
}
