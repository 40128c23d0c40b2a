//! Error service: ingestion and read orchestration over the store and
//! cache gateways.
//!
//! Ingestion prefers handing the event to the cache-backed work queue and
//! returns optimistically; when the queue is unavailable it degrades to a
//! synchronous store write so durability never depends on the cache being
//! up. Reads are cache-first with the store as the authority on a miss.
//! Every mutation ends with a bulk cache invalidation; invalidation
//! failures are logged and swallowed because staleness is bounded by TTL.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::cache::CacheStore;
use crate::domain::{ClientMeta, ErrorEvent, ErrorLevel, ErrorStats, NewError};
use crate::error::GatewayError;
use crate::persistence::ErrorStore;

/// Upper bound on a background list-cache populate task.
const CACHE_POPULATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestration layer for all error-event operations.
///
/// Stateless coordinator: owns handles to the [`ErrorStore`] and the
/// [`CacheStore`] and holds no mutable in-process state, so it is freely
/// cloned into every request task.
#[derive(Clone)]
pub struct ErrorService {
    store: Arc<dyn ErrorStore>,
    cache: Arc<dyn CacheStore>,
    list_ttl: Duration,
}

impl std::fmt::Debug for ErrorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorService")
            .field("list_ttl", &self.list_ttl)
            .finish_non_exhaustive()
    }
}

impl ErrorService {
    /// Creates a new service over the given gateways.
    ///
    /// `list_ttl` is the expiry applied to cached list pages.
    #[must_use]
    pub fn new(
        store: Arc<dyn ErrorStore>,
        cache: Arc<dyn CacheStore>,
        list_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            list_ttl,
        }
    }

    /// Ingests a new error event.
    ///
    /// Validates the submission, builds the event (fingerprint included),
    /// and enqueues it for asynchronous persistence. The returned event is
    /// optimistic: the caller sees it before it is guaranteed durable. When
    /// the queue is unavailable the event is written to the store
    /// synchronously instead, trading latency for guaranteed persistence.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any side effect, or
    /// [`GatewayError::StorageUnavailable`] when both the queue and the
    /// synchronous fallback fail (in which case nothing was stored).
    pub async fn submit(
        &self,
        submission: NewError,
        client: ClientMeta,
    ) -> Result<ErrorEvent, GatewayError> {
        let event = ErrorEvent::from_submission(submission, client)?;

        match self.cache.enqueue(&event).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %event.id,
                    fingerprint = %event.fingerprint,
                    source = %event.source,
                    "error event queued for persistence"
                );
            }
            Err(enqueue_err) => {
                tracing::warn!(
                    error = %enqueue_err,
                    event_id = %event.id,
                    "enqueue failed, falling back to synchronous insert"
                );
                self.store.create_error(&event).await?;
            }
        }

        self.invalidate_caches("submit").await;
        Ok(event)
    }

    /// Returns one page of events plus a total count.
    ///
    /// Cache-first: the cache key is derived from the exact
    /// filter/pagination tuple. On a hit the total is approximated as
    /// `page length + offset` because cached pages do not store the true
    /// count. On a miss the store provides both the page and the exact
    /// total, and a non-empty page is cached in a background task without
    /// blocking the response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StorageUnavailable`] when the cache missed
    /// (or failed) and the store also failed.
    pub async fn list_errors(
        &self,
        limit: i64,
        offset: i64,
        level: Option<ErrorLevel>,
        source: Option<&str>,
    ) -> Result<(Vec<ErrorEvent>, i64), GatewayError> {
        let key = list_cache_key(limit, offset, level, source);

        match self.cache.cached_list(&key).await {
            Ok(Some(events)) => {
                let total = events.len() as i64 + offset;
                return Ok((events, total));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "list cache read failed, using store");
            }
        }

        let (events, total) = self.store.get_errors(limit, offset, level, source).await?;

        if !events.is_empty() {
            let cache = Arc::clone(&self.cache);
            let page = events.clone();
            let ttl = self.list_ttl;
            tokio::spawn(async move {
                let populate = cache.cache_list(&key, &page, ttl);
                match tokio::time::timeout(CACHE_POPULATE_TIMEOUT, populate).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, key = %key, "list cache populate failed");
                    }
                    Err(_) => tracing::warn!(key = %key, "list cache populate timed out"),
                }
            });
        }

        Ok((events, total))
    }

    /// Fetches a single event by ID straight from the store.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] for an unknown ID and
    /// [`GatewayError::StorageUnavailable`] on store failure.
    pub async fn get_error(&self, id: Uuid) -> Result<ErrorEvent, GatewayError> {
        self.store.get_error_by_id(id).await
    }

    /// Marks an event resolved. Idempotent for existing events; resolution
    /// never reverts. Invalidates all read caches since both list contents
    /// and statistics change.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] for an unknown ID and
    /// [`GatewayError::StorageUnavailable`] on store failure.
    pub async fn resolve_error(&self, id: Uuid) -> Result<(), GatewayError> {
        self.store.resolve_error(id).await?;
        self.invalidate_caches("resolve").await;
        Ok(())
    }

    /// Permanently deletes an event and invalidates all read caches.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ErrorNotFound`] for an unknown ID and
    /// [`GatewayError::StorageUnavailable`] on store failure.
    pub async fn delete_error(&self, id: Uuid) -> Result<(), GatewayError> {
        self.store.delete_error(id).await?;
        self.invalidate_caches("delete").await;
        Ok(())
    }

    /// Returns aggregate statistics, cache-first.
    ///
    /// A cache error degrades to a store read; a fresh result is cached
    /// with the backend's stats TTL, failures logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StorageUnavailable`] on store failure.
    pub async fn get_stats(&self) -> Result<ErrorStats, GatewayError> {
        match self.cache.cached_stats().await {
            Ok(Some(stats)) => return Ok(stats),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "stats cache read failed, using store");
            }
        }

        let stats = self.store.get_stats().await?;
        if let Err(e) = self.cache.cache_stats(&stats).await {
            tracing::warn!(error = %e, "stats cache populate failed");
        }
        Ok(stats)
    }

    /// Returns the most recently enqueued events from the bounded ring.
    ///
    /// The ring is advisory: on cache failure this degrades to an empty
    /// list rather than surfacing an error.
    pub async fn recent_errors(&self, limit: usize) -> Vec<ErrorEvent> {
        match self.cache.recent_errors(limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "recent ring read failed");
                Vec::new()
            }
        }
    }

    async fn invalidate_caches(&self, after: &str) {
        if let Err(e) = self.cache.invalidate_all().await {
            tracing::warn!(error = %e, after, "cache invalidation failed");
        }
    }
}

/// Deterministic cache key for a list query: the exact filter and
/// pagination tuple, absent filters rendered empty.
fn list_cache_key(
    limit: i64,
    offset: i64,
    level: Option<ErrorLevel>,
    source: Option<&str>,
) -> String {
    format!(
        "list_{limit}_{offset}_{}_{}",
        level.map(ErrorLevel::as_str).unwrap_or(""),
        source.unwrap_or("")
    )
}
