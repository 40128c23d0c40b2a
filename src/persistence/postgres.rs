//! PostgreSQL implementation of the durable error store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ErrorStore;
use super::models::ErrorRow;
use crate::domain::{ErrorEvent, ErrorLevel, ErrorStats};
use crate::error::GatewayError;

const SELECT_COLUMNS: &str = "id, timestamp, level, message, stack_trace, context, source, \
     environment, user_agent, ip_address, url, fingerprint, resolved, \
     count, first_seen, last_seen, created_at, updated_at";

/// PostgreSQL-backed error store using a shared `sqlx::PgPool`.
///
/// The pool bounds concurrent connections and is safely shared across all
/// request tasks and the queue worker.
#[derive(Debug, Clone)]
pub struct PostgresErrorStore {
    pool: PgPool,
}

impl PostgresErrorStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_where(&self, predicate: &str) -> Result<i64, GatewayError> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM errors {predicate}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))
    }
}

#[async_trait]
impl ErrorStore for PostgresErrorStore {
    async fn create_error(&self, event: &ErrorEvent) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO errors ( \
                 id, timestamp, level, message, stack_trace, context, source, \
                 environment, user_agent, ip_address, url, fingerprint, resolved, \
                 count, first_seen, last_seen, created_at, updated_at \
             ) VALUES ( \
                 $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18 \
             )",
        )
        .bind(event.id)
        .bind(event.timestamp)
        .bind(event.level.as_str())
        .bind(&event.message)
        .bind(&event.stack_trace)
        .bind(serde_json::Value::Object(event.context.clone()))
        .bind(&event.source)
        .bind(&event.environment)
        .bind(&event.user_agent)
        .bind(&event.ip_address)
        .bind(&event.url)
        .bind(&event.fingerprint)
        .bind(event.resolved)
        .bind(event.count)
        .bind(event.first_seen)
        .bind(event.last_seen)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn get_errors(
        &self,
        limit: i64,
        offset: i64,
        level: Option<ErrorLevel>,
        source: Option<&str>,
    ) -> Result<(Vec<ErrorEvent>, i64), GatewayError> {
        let level_filter = level.map(ErrorLevel::as_str);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM errors \
             WHERE ($1::text IS NULL OR level = $1) AND ($2::text IS NULL OR source = $2)",
        )
        .bind(level_filter)
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        let rows = sqlx::query_as::<_, ErrorRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM errors \
             WHERE ($1::text IS NULL OR level = $1) AND ($2::text IS NULL OR source = $2) \
             ORDER BY timestamp DESC LIMIT $3 OFFSET $4",
        ))
        .bind(level_filter)
        .bind(source)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        Ok((rows.into_iter().map(ErrorEvent::from).collect(), total))
    }

    async fn get_error_by_id(&self, id: Uuid) -> Result<ErrorEvent, GatewayError> {
        let row = sqlx::query_as::<_, ErrorRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM errors WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        row.map(ErrorEvent::from)
            .ok_or(GatewayError::ErrorNotFound(id))
    }

    async fn resolve_error(&self, id: Uuid) -> Result<(), GatewayError> {
        let result = sqlx::query("UPDATE errors SET resolved = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::ErrorNotFound(id));
        }
        Ok(())
    }

    async fn delete_error(&self, id: Uuid) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM errors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::StorageUnavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::ErrorNotFound(id));
        }
        Ok(())
    }

    async fn get_stats(&self) -> Result<ErrorStats, GatewayError> {
        let total_errors = self.count_where("").await?;
        let resolved_errors = self.count_where("WHERE resolved = TRUE").await?;
        let errors_today = self
            .count_where("WHERE DATE(timestamp) = CURRENT_DATE")
            .await?;
        let errors_this_week = self
            .count_where("WHERE timestamp >= NOW() - INTERVAL '7 days'")
            .await?;
        let errors_this_month = self
            .count_where("WHERE timestamp >= NOW() - INTERVAL '30 days'")
            .await?;
        let errors_24h = self
            .count_where("WHERE timestamp >= NOW() - INTERVAL '24 hours'")
            .await?;

        #[allow(clippy::cast_precision_loss)]
        let error_rate_24h = errors_24h as f64 / 24.0;
        #[allow(clippy::cast_precision_loss)]
        let resolution_rate = if total_errors > 0 {
            (resolved_errors as f64 / total_errors as f64) * 100.0
        } else {
            0.0
        };

        Ok(ErrorStats {
            total_errors,
            resolved_errors,
            errors_today,
            errors_this_week,
            errors_this_month,
            error_rate_24h,
            resolution_rate,
        })
    }
}
