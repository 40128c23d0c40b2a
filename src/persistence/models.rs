//! Database row model for the `errors` table.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ErrorEvent;

/// A row from the `errors` table.
///
/// Kept separate from [`ErrorEvent`] so column representation (text level,
/// JSONB context) stays a storage concern. Conversion back to the domain
/// entity is lossy-tolerant: an unknown level falls back to the default and
/// a non-object context becomes an empty map.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ErrorRow {
    /// Event ID.
    pub id: Uuid,
    /// Occurrence time.
    pub timestamp: DateTime<Utc>,
    /// Severity level as stored text.
    pub level: String,
    /// Error message.
    pub message: String,
    /// Optional stack trace.
    pub stack_trace: Option<String>,
    /// Context metadata as JSONB.
    pub context: serde_json::Value,
    /// Originating application or component.
    pub source: String,
    /// Deployment environment tag.
    pub environment: String,
    /// Captured user agent.
    pub user_agent: Option<String>,
    /// Captured client IP.
    pub ip_address: Option<String>,
    /// Reported URL.
    pub url: Option<String>,
    /// Grouping fingerprint.
    pub fingerprint: String,
    /// Resolution flag.
    pub resolved: bool,
    /// Occurrence count.
    pub count: i32,
    /// First occurrence.
    pub first_seen: DateTime<Utc>,
    /// Most recent occurrence.
    pub last_seen: DateTime<Utc>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ErrorRow> for ErrorEvent {
    fn from(row: ErrorRow) -> Self {
        let context = match row.context {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            id: row.id,
            timestamp: row.timestamp,
            level: row.level.parse().unwrap_or_default(),
            message: row.message,
            stack_trace: row.stack_trace,
            context,
            source: row.source,
            environment: row.environment,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            url: row.url,
            fingerprint: row.fingerprint,
            resolved: row.resolved,
            count: row.count,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorLevel;

    fn row() -> ErrorRow {
        let now = Utc::now();
        ErrorRow {
            id: Uuid::new_v4(),
            timestamp: now,
            level: "warning".to_string(),
            message: "boom".to_string(),
            stack_trace: None,
            context: serde_json::json!({"k": 1}),
            source: "backend".to_string(),
            environment: "production".to_string(),
            user_agent: None,
            ip_address: None,
            url: None,
            fingerprint: "deadbeefdeadbeef".to_string(),
            resolved: false,
            count: 1,
            first_seen: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn converts_level_and_context() {
        let event = ErrorEvent::from(row());
        assert_eq!(event.level, ErrorLevel::Warning);
        assert_eq!(event.context.get("k"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn unknown_level_falls_back_to_default() {
        let mut stored = row();
        stored.level = "catastrophic".to_string();
        let event = ErrorEvent::from(stored);
        assert_eq!(event.level, ErrorLevel::Error);
    }

    #[test]
    fn non_object_context_becomes_empty_map() {
        let mut stored = row();
        stored.context = serde_json::json!([1, 2, 3]);
        let event = ErrorEvent::from(stored);
        assert!(event.context.is_empty());
    }
}
