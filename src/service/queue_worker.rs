//! Background queue worker: the single consumer of the durable-write
//! work queue.
//!
//! Exactly one worker runs per process, constructed and started by the
//! composition root and handed a shutdown signal. The loop blocks on the
//! queue with a bounded wait so shutdown is observed between items, never
//! mid-item; an item that was already dequeued is still processed before
//! exit. Once an item is dequeued, delivery is at most once: a persistence
//! failure is logged and the item dropped, and the loop keeps running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::cache::CacheStore;
use crate::domain::ErrorEvent;
use crate::persistence::ErrorStore;

/// Pause after a failed dequeue before retrying, so a down cache does not
/// turn the loop into a busy spin.
const DEQUEUE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Single long-running consumer that drains the work queue into the store.
pub struct QueueWorker {
    store: Arc<dyn ErrorStore>,
    cache: Arc<dyn CacheStore>,
    poll_timeout: Duration,
}

impl std::fmt::Debug for QueueWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueWorker")
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl QueueWorker {
    /// Creates a worker over the given gateways.
    ///
    /// `poll_timeout` bounds each blocking dequeue wait and therefore the
    /// worker's shutdown latency.
    #[must_use]
    pub fn new(
        store: Arc<dyn ErrorStore>,
        cache: Arc<dyn CacheStore>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            poll_timeout,
        }
    }

    /// Runs the drain loop until `shutdown` flips to `true`.
    ///
    /// Persistence ordering follows FIFO-of-enqueue: the single consumer
    /// processes items strictly serially.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        tracing::info!("queue worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.cache.dequeue_blocking(self.poll_timeout).await {
                Ok(Some(event)) => self.persist(event).await,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "dequeue failed");
                    tokio::time::sleep(DEQUEUE_RETRY_DELAY).await;
                }
            }
        }

        tracing::info!("queue worker stopped");
    }

    async fn persist(&self, event: ErrorEvent) {
        if let Err(e) = self.store.create_error(&event).await {
            // At most once: a dequeued item that fails to persist is lost.
            tracing::error!(
                event_id = %event.id,
                error = %e,
                "failed to persist dequeued event, dropping it"
            );
            return;
        }

        tracing::debug!(event_id = %event.id, "queued event persisted");

        if let Err(e) = self.cache.invalidate_all().await {
            tracing::warn!(error = %e, "cache invalidation failed after queued persist");
        }
    }
}
