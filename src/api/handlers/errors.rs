//! Error-event handlers: submit, list, recent, detail, resolve, delete,
//! and stats.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{ErrorListParams, ErrorListResponse, RecentParams, SubmitErrorRequest};
use crate::app_state::AppState;
use crate::domain::{ClientMeta, ErrorEvent, ErrorLevel, ErrorStats};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /errors` — Submit a new error event.
///
/// The user agent and client IP are captured from the request itself; the
/// response is optimistic and may precede durable persistence.
///
/// # Errors
///
/// Returns [`GatewayError`] on validation failure or when both the queue
/// and the fallback store write fail.
#[utoipa::path(
    post,
    path = "/api/v1/errors",
    tag = "Errors",
    summary = "Submit an error event",
    description = "Ingests an error event: computes its grouping fingerprint, queues it for asynchronous persistence (falling back to a synchronous write when the queue is unavailable), and invalidates cached reads.",
    request_body = SubmitErrorRequest,
    responses(
        (status = 201, description = "Event accepted", body = ErrorEvent),
        (status = 400, description = "Invalid submission", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn submit_error(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubmitErrorRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let client = ClientMeta {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ip_address: Some(addr.ip().to_string()),
    };

    let event = state.error_service.submit(req.into(), client).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /errors` — List error events with pagination and filters.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid level filter or store failure.
#[utoipa::path(
    get,
    path = "/api/v1/errors",
    tag = "Errors",
    summary = "List error events",
    description = "Returns one page of events, newest first, served from cache when a fresh page for the same filter tuple exists.",
    params(ErrorListParams),
    responses(
        (status = 200, description = "Paginated event list", body = ErrorListResponse),
        (status = 400, description = "Invalid level filter", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_errors(
    State(state): State<AppState>,
    Query(params): Query<ErrorListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let params = params.clamped();
    let level = params
        .level
        .as_deref()
        .map(str::parse::<ErrorLevel>)
        .transpose()?;

    let (events, total) = state
        .error_service
        .list_errors(params.limit, params.offset, level, params.source.as_deref())
        .await?;

    Ok(Json(ErrorListResponse {
        errors: events,
        total,
        page: params.offset / params.limit + 1,
        limit: params.limit,
    }))
}

/// `GET /errors/recent` — Most recently enqueued events.
#[utoipa::path(
    get,
    path = "/api/v1/errors/recent",
    tag = "Errors",
    summary = "Recently ingested events",
    description = "Returns the latest enqueued events from the bounded recent-items ring. Advisory: degrades to an empty list when the cache is unavailable.",
    params(RecentParams),
    responses(
        (status = 200, description = "Recent events, newest first", body = Vec<ErrorEvent>),
    )
)]
pub async fn recent_errors(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    Json(state.error_service.recent_errors(params.limit).await)
}

/// `GET /errors/:id` — Event details.
///
/// # Errors
///
/// Returns [`GatewayError::ErrorNotFound`] for an unknown ID.
#[utoipa::path(
    get,
    path = "/api/v1/errors/{id}",
    tag = "Errors",
    summary = "Get event details",
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = ErrorEvent),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let event = state.error_service.get_error(id).await?;
    Ok(Json(event))
}

/// `PUT /errors/:id/resolve` — Mark an event resolved.
///
/// # Errors
///
/// Returns [`GatewayError::ErrorNotFound`] for an unknown ID.
#[utoipa::path(
    put,
    path = "/api/v1/errors/{id}/resolve",
    tag = "Errors",
    summary = "Resolve an event",
    description = "One-way transition: a resolved event never reverts to open. Re-resolving succeeds.",
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 204, description = "Event resolved"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn resolve_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state.error_service.resolve_error(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /errors/:id` — Permanently delete an event.
///
/// # Errors
///
/// Returns [`GatewayError::ErrorNotFound`] for an unknown ID.
#[utoipa::path(
    delete,
    path = "/api/v1/errors/{id}",
    tag = "Errors",
    summary = "Delete an event",
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state.error_service.delete_error(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /stats` — Aggregate error statistics.
///
/// # Errors
///
/// Returns [`GatewayError::StorageUnavailable`] when the cache missed and
/// the store failed.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Errors",
    summary = "Aggregate statistics",
    description = "Counts and rates over all stored events, cached for a few minutes.",
    responses(
        (status = 200, description = "Aggregate statistics", body = ErrorStats),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let stats = state.error_service.get_stats().await?;
    Ok(Json(stats))
}

/// Error-event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/errors", post(submit_error).get(list_errors))
        .route("/errors/recent", get(recent_errors))
        .route("/errors/{id}", get(get_error).delete(delete_error))
        .route("/errors/{id}/resolve", put(resolve_error))
        .route("/stats", get(get_stats))
}
