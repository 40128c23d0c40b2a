//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; `/health` and the
//! optional Swagger UI live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// OpenAPI document covering every exposed route.
#[derive(Debug, utoipa::OpenApi)]
#[openapi(
    paths(
        handlers::errors::submit_error,
        handlers::errors::list_errors,
        handlers::errors::recent_errors,
        handlers::errors::get_error,
        handlers::errors::resolve_error,
        handlers::errors::delete_error,
        handlers::errors::get_stats,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Errors", description = "Error-event ingestion and querying"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", <ApiDoc as utoipa::OpenApi>::openapi()),
    );

    router
}
