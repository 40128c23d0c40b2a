//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ErrorService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Error service for all business logic.
    pub error_service: Arc<ErrorService>,
}
