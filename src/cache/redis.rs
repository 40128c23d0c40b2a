//! Redis implementation of the cache/queue backend.
//!
//! Key layout:
//! - `error_queue` — LPUSH/BRPOP work queue between ingestion and the worker.
//! - `recent_errors` — LTRIM-bounded ring of the latest enqueued events.
//! - `error_cache:<key>` — per-filter list pages with a TTL, tracked in
//!   `cache_keys_set` so bulk invalidation never scans the keyspace.
//! - `stats_cache` — aggregate statistics with a TTL.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::CacheStore;
use crate::domain::{ErrorEvent, ErrorStats};
use crate::error::GatewayError;

const QUEUE_KEY: &str = "error_queue";
const RECENT_KEY: &str = "recent_errors";
const LIST_CACHE_PREFIX: &str = "error_cache:";
const STATS_CACHE_KEY: &str = "stats_cache";
const CACHE_KEYS_SET: &str = "cache_keys_set";

/// Redis-backed cache and work queue over a shared multiplexed connection.
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// operation works on a clone and the struct is freely shared across tasks.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    recent_capacity: usize,
    stats_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("recent_capacity", &self.recent_capacity)
            .field("stats_ttl", &self.stats_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Wraps an established connection manager.
    #[must_use]
    pub fn new(conn: ConnectionManager, recent_capacity: usize, stats_ttl: Duration) -> Self {
        Self {
            conn,
            recent_capacity,
            stats_ttl,
        }
    }

    /// Connects to Redis and verifies the connection with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CacheUnavailable`] when the URL is invalid or
    /// the server is unreachable.
    pub async fn connect(
        redis_url: &str,
        recent_capacity: usize,
        stats_ttl: Duration,
    ) -> Result<Self, GatewayError> {
        let client = redis::Client::open(redis_url).map_err(to_cache_err)?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(to_cache_err)?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_cache_err)?;
        Ok(Self::new(conn, recent_capacity, stats_ttl))
    }
}

fn to_cache_err(e: redis::RedisError) -> GatewayError {
    GatewayError::CacheUnavailable(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, GatewayError> {
    serde_json::to_string(value).map_err(|e| GatewayError::Internal(e.to_string()))
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn enqueue(&self, event: &ErrorEvent) -> Result<(), GatewayError> {
        let payload = encode(event)?;
        let mut conn = self.conn.clone();
        #[allow(clippy::cast_possible_wrap)]
        let ring_end = self.recent_capacity as isize - 1;
        redis::pipe()
            .lpush(QUEUE_KEY, &payload)
            .lpush(RECENT_KEY, &payload)
            .ltrim(RECENT_KEY, 0, ring_end)
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_cache_err)?;
        tracing::debug!(event_id = %event.id, "event enqueued");
        Ok(())
    }

    async fn dequeue_blocking(
        &self,
        timeout: Duration,
    ) -> Result<Option<ErrorEvent>, GatewayError> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .brpop(QUEUE_KEY, timeout.as_secs_f64())
            .await
            .map_err(to_cache_err)?;

        match popped {
            None => Ok(None),
            Some((_, payload)) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| GatewayError::CacheUnavailable(format!("bad queue entry: {e}"))),
        }
    }

    async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorEvent>, GatewayError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        #[allow(clippy::cast_possible_wrap)]
        let end = limit as isize - 1;
        let entries: Vec<String> = conn
            .lrange(RECENT_KEY, 0, end)
            .await
            .map_err(to_cache_err)?;
        Ok(entries
            .iter()
            .filter_map(|entry| serde_json::from_str(entry).ok())
            .collect())
    }

    async fn cache_list(
        &self,
        key: &str,
        events: &[ErrorEvent],
        ttl: Duration,
    ) -> Result<(), GatewayError> {
        let payload = encode(&events)?;
        let full_key = format!("{LIST_CACHE_PREFIX}{key}");
        let mut conn = self.conn.clone();
        redis::pipe()
            .set_ex(&full_key, payload, ttl.as_secs())
            .sadd(CACHE_KEYS_SET, &full_key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_cache_err)?;
        tracing::debug!(key, count = events.len(), ttl_secs = ttl.as_secs(), "list page cached");
        Ok(())
    }

    async fn cached_list(&self, key: &str) -> Result<Option<Vec<ErrorEvent>>, GatewayError> {
        let full_key = format!("{LIST_CACHE_PREFIX}{key}");
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(&full_key).await.map_err(to_cache_err)?;
        let Some(payload) = payload else {
            tracing::debug!(key, "list cache miss");
            return Ok(None);
        };
        let events = serde_json::from_str(&payload)
            .map_err(|e| GatewayError::CacheUnavailable(format!("bad cached list: {e}")))?;
        tracing::debug!(key, "list cache hit");
        Ok(Some(events))
    }

    async fn cache_stats(&self, stats: &ErrorStats) -> Result<(), GatewayError> {
        let payload = encode(stats)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(STATS_CACHE_KEY, payload, self.stats_ttl.as_secs())
            .await
            .map_err(to_cache_err)?;
        tracing::debug!(ttl_secs = self.stats_ttl.as_secs(), "stats cached");
        Ok(())
    }

    async fn cached_stats(&self) -> Result<Option<ErrorStats>, GatewayError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(STATS_CACHE_KEY).await.map_err(to_cache_err)?;
        let Some(payload) = payload else {
            tracing::debug!("stats cache miss");
            return Ok(None);
        };
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| GatewayError::CacheUnavailable(format!("bad cached stats: {e}")))
    }

    async fn invalidate_all(&self) -> Result<(), GatewayError> {
        let mut conn = self.conn.clone();
        let list_keys: Vec<String> = conn.smembers(CACHE_KEYS_SET).await.map_err(to_cache_err)?;

        let mut pipe = redis::pipe();
        if !list_keys.is_empty() {
            pipe.del(&list_keys);
        }
        pipe.del(CACHE_KEYS_SET).del(STATS_CACHE_KEY);
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(to_cache_err)?;

        tracing::debug!(list_keys = list_keys.len(), "read caches invalidated");
        Ok(())
    }
}
