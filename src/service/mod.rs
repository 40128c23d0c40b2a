//! Service layer: ingestion and read orchestration plus the queue worker.

pub mod error_service;
pub mod queue_worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error_service::ErrorService;
pub use queue_worker::QueueWorker;
