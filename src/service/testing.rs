//! In-memory gateway fakes with fault injection for service and worker
//! tests. No Redis or PostgreSQL instance is required.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::domain::{ErrorEvent, ErrorLevel, ErrorStats};
use crate::error::GatewayError;
use crate::persistence::ErrorStore;

/// In-memory [`ErrorStore`] keeping rows in insertion order.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<Vec<ErrorEvent>>,
    fail: AtomicBool,
    list_calls: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn rows(&self) -> Vec<ErrorEvent> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::StorageUnavailable(
                "injected store failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ErrorStore for MemoryStore {
    async fn create_error(&self, event: &ErrorEvent) -> Result<(), GatewayError> {
        self.check()?;
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(event.clone());
        }
        Ok(())
    }

    async fn get_errors(
        &self,
        limit: i64,
        offset: i64,
        level: Option<ErrorLevel>,
        source: Option<&str>,
    ) -> Result<(Vec<ErrorEvent>, i64), GatewayError> {
        self.check()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows();
        let mut matching: Vec<ErrorEvent> = rows
            .into_iter()
            .filter(|e| level.is_none_or(|l| e.level == l))
            .filter(|e| source.is_none_or(|s| e.source == s))
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok((page, total))
    }

    async fn get_error_by_id(&self, id: Uuid) -> Result<ErrorEvent, GatewayError> {
        self.check()?;
        self.rows()
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(GatewayError::ErrorNotFound(id))
    }

    async fn resolve_error(&self, id: Uuid) -> Result<(), GatewayError> {
        self.check()?;
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| GatewayError::Internal("poisoned lock".to_string()))?;
        let row = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(GatewayError::ErrorNotFound(id))?;
        row.resolved = true;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_error(&self, id: Uuid) -> Result<(), GatewayError> {
        self.check()?;
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| GatewayError::Internal("poisoned lock".to_string()))?;
        let before = rows.len();
        rows.retain(|e| e.id != id);
        if rows.len() == before {
            return Err(GatewayError::ErrorNotFound(id));
        }
        Ok(())
    }

    async fn get_stats(&self) -> Result<ErrorStats, GatewayError> {
        self.check()?;
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows();
        let total = rows.len() as i64;
        let resolved = rows.iter().filter(|e| e.resolved).count() as i64;
        #[allow(clippy::cast_precision_loss)]
        let resolution_rate = if total > 0 {
            (resolved as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let error_rate_24h = total as f64 / 24.0;
        Ok(ErrorStats {
            total_errors: total,
            resolved_errors: resolved,
            errors_today: total,
            errors_this_week: total,
            errors_this_month: total,
            error_rate_24h,
            resolution_rate,
        })
    }
}

/// In-memory [`CacheStore`] with per-concern fault injection.
#[derive(Debug, Default)]
pub(crate) struct MemoryCache {
    queue: Mutex<VecDeque<ErrorEvent>>,
    recent: Mutex<VecDeque<ErrorEvent>>,
    lists: Mutex<HashMap<String, Vec<ErrorEvent>>>,
    stats: Mutex<Option<ErrorStats>>,
    fail_enqueue: AtomicBool,
    fail_reads: AtomicBool,
    invalidations: AtomicUsize,
}

impl MemoryCache {
    pub(crate) fn set_enqueue_failing(&self, failing: bool) {
        self.fail_enqueue.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn set_reads_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub(crate) fn queued(&self) -> Vec<ErrorEvent> {
        self.queue
            .lock()
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn has_cached_list(&self, key: &str) -> bool {
        self.lists
            .lock()
            .map(|lists| lists.contains_key(key))
            .unwrap_or(false)
    }

    fn check_reads(&self) -> Result<(), GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::CacheUnavailable(
                "injected cache failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn enqueue(&self, event: &ErrorEvent) -> Result<(), GatewayError> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(GatewayError::CacheUnavailable(
                "injected enqueue failure".to_string(),
            ));
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(event.clone());
        }
        if let Ok(mut recent) = self.recent.lock() {
            recent.push_front(event.clone());
            recent.truncate(100);
        }
        Ok(())
    }

    async fn dequeue_blocking(
        &self,
        timeout: Duration,
    ) -> Result<Option<ErrorEvent>, GatewayError> {
        let popped = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        if popped.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(popped)
    }

    async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorEvent>, GatewayError> {
        self.check_reads()?;
        Ok(self
            .recent
            .lock()
            .map(|recent| recent.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn cache_list(
        &self,
        key: &str,
        events: &[ErrorEvent],
        _ttl: Duration,
    ) -> Result<(), GatewayError> {
        if let Ok(mut lists) = self.lists.lock() {
            lists.insert(key.to_string(), events.to_vec());
        }
        Ok(())
    }

    async fn cached_list(&self, key: &str) -> Result<Option<Vec<ErrorEvent>>, GatewayError> {
        self.check_reads()?;
        Ok(self
            .lists
            .lock()
            .ok()
            .and_then(|lists| lists.get(key).cloned()))
    }

    async fn cache_stats(&self, stats: &ErrorStats) -> Result<(), GatewayError> {
        if let Ok(mut slot) = self.stats.lock() {
            *slot = Some(stats.clone());
        }
        Ok(())
    }

    async fn cached_stats(&self) -> Result<Option<ErrorStats>, GatewayError> {
        self.check_reads()?;
        Ok(self.stats.lock().ok().and_then(|slot| slot.clone()))
    }

    async fn invalidate_all(&self) -> Result<(), GatewayError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut lists) = self.lists.lock() {
            lists.clear();
        }
        if let Ok(mut slot) = self.stats.lock() {
            *slot = None;
        }
        Ok(())
    }
}
