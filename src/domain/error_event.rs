//! The central error-event entity and its aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::fingerprint::fingerprint;
use crate::error::GatewayError;

/// Environment tag applied when the submission does not carry one.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Severity level of an error event.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    /// Application error (the default).
    #[default]
    Error,
    /// Recoverable or degraded condition.
    Warning,
    /// Informational event.
    Info,
    /// Diagnostic event.
    Debug,
}

impl ErrorLevel {
    /// Returns the canonical lowercase string for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl std::fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorLevel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(GatewayError::InvalidLevel(other.to_string())),
        }
    }
}

/// A single ingested error event.
///
/// Every submission becomes a new stored event with `count = 1` and
/// `first_seen = last_seen = timestamp`. The fingerprint groups events with
/// identical message + stack trace but repeat occurrences are not merged
/// into one record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEvent {
    /// Unique event ID, assigned at creation.
    pub id: Uuid,
    /// Event occurrence time (server-assigned at ingestion).
    pub timestamp: DateTime<Utc>,
    /// Severity level.
    pub level: ErrorLevel,
    /// Error message (never empty).
    pub message: String,
    /// Optional stack trace.
    pub stack_trace: Option<String>,
    /// Arbitrary caller-supplied structured metadata. Never null after
    /// normalization; persisted as an opaque JSON blob.
    #[schema(value_type = Object)]
    pub context: serde_json::Map<String, serde_json::Value>,
    /// Originating application or component.
    pub source: String,
    /// Deployment environment tag, defaults to `"production"`.
    pub environment: String,
    /// User agent captured server-side from the request.
    pub user_agent: Option<String>,
    /// Client IP captured server-side from the request.
    pub ip_address: Option<String>,
    /// URL the error occurred on, if reported.
    pub url: Option<String>,
    /// Grouping fingerprint: 16 hex chars derived from message + stack.
    pub fingerprint: String,
    /// Whether the error has been marked resolved. Monotone false → true.
    pub resolved: bool,
    /// Occurrence count. Always 1 in the current design.
    pub count: i32,
    /// First occurrence of this event.
    pub first_seen: DateTime<Utc>,
    /// Most recent occurrence of this event.
    pub last_seen: DateTime<Utc>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a new error event.
///
/// Carries only client-supplied fields; request metadata (user agent, IP)
/// arrives separately via [`ClientMeta`] and is never trusted from the body.
#[derive(Debug, Clone, Default)]
pub struct NewError {
    /// Severity level string, validated against [`ErrorLevel`] or defaulted.
    pub level: Option<String>,
    /// Error message, required non-empty.
    pub message: String,
    /// Optional stack trace.
    pub stack_trace: Option<String>,
    /// Optional structured metadata.
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
    /// Originating application or component, required non-empty.
    pub source: String,
    /// Deployment environment tag.
    pub environment: Option<String>,
    /// URL the error occurred on.
    pub url: Option<String>,
}

/// Request metadata captured by the transport layer at ingestion.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Remote peer address.
    pub ip_address: Option<String>,
}

impl ErrorEvent {
    /// Builds a fresh event from a validated submission.
    ///
    /// Assigns a new ID, stamps all timestamps with the current server time,
    /// computes the fingerprint, normalizes the context to an empty map when
    /// absent, and starts the event unresolved with `count = 1`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when `message` or `source`
    /// is empty and [`GatewayError::InvalidLevel`] on an unknown level
    /// string. Rejection happens before any side effect.
    pub fn from_submission(
        submission: NewError,
        client: ClientMeta,
    ) -> Result<Self, GatewayError> {
        if submission.message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }
        if submission.source.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "source must not be empty".to_string(),
            ));
        }
        let level = match submission.level.as_deref() {
            None | Some("") => ErrorLevel::default(),
            Some(s) => s.parse()?,
        };

        let now = Utc::now();
        let fingerprint = fingerprint(&submission.message, submission.stack_trace.as_deref());

        Ok(Self {
            id: Uuid::new_v4(),
            timestamp: now,
            level,
            message: submission.message,
            stack_trace: submission.stack_trace,
            context: submission.context.unwrap_or_default(),
            source: submission.source,
            environment: submission
                .environment
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            user_agent: client.user_agent,
            ip_address: client.ip_address,
            url: submission.url,
            fingerprint,
            resolved: false,
            count: 1,
            first_seen: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Aggregate statistics over all stored error events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorStats {
    /// Total stored events.
    pub total_errors: i64,
    /// Events marked resolved.
    pub resolved_errors: i64,
    /// Events with a timestamp on the current day.
    pub errors_today: i64,
    /// Events within the last 7 days.
    pub errors_this_week: i64,
    /// Events within the last 30 days.
    pub errors_this_month: i64,
    /// Events per hour over the last 24 hours.
    pub error_rate_24h: f64,
    /// Resolved percentage of all events.
    pub resolution_rate: f64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn submission() -> NewError {
        NewError {
            level: Some("error".to_string()),
            message: "DB timeout".to_string(),
            stack_trace: Some("at db.rs:42".to_string()),
            context: None,
            source: "backend".to_string(),
            environment: None,
            url: None,
        }
    }

    #[test]
    fn from_submission_initializes_lifecycle_fields() {
        let Ok(event) = ErrorEvent::from_submission(submission(), ClientMeta::default()) else {
            panic!("valid submission rejected");
        };
        assert!(!event.resolved);
        assert_eq!(event.count, 1);
        assert_eq!(event.first_seen, event.timestamp);
        assert_eq!(event.last_seen, event.timestamp);
        assert_eq!(event.fingerprint.len(), 16);
        assert_eq!(event.environment, DEFAULT_ENVIRONMENT);
        assert!(event.context.is_empty());
    }

    #[test]
    fn identical_submissions_get_distinct_ids_same_fingerprint() {
        let Ok(a) = ErrorEvent::from_submission(submission(), ClientMeta::default()) else {
            panic!("valid submission rejected");
        };
        let Ok(b) = ErrorEvent::from_submission(submission(), ClientMeta::default()) else {
            panic!("valid submission rejected");
        };
        assert_ne!(a.id, b.id);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn empty_message_is_rejected() {
        let result = ErrorEvent::from_submission(
            NewError {
                message: "   ".to_string(),
                source: "backend".to_string(),
                ..NewError::default()
            },
            ClientMeta::default(),
        );
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn empty_source_is_rejected() {
        let result = ErrorEvent::from_submission(
            NewError {
                message: "boom".to_string(),
                source: String::new(),
                ..NewError::default()
            },
            ClientMeta::default(),
        );
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let result = ErrorEvent::from_submission(
            NewError {
                level: Some("fatal".to_string()),
                message: "boom".to_string(),
                source: "backend".to_string(),
                ..NewError::default()
            },
            ClientMeta::default(),
        );
        assert!(matches!(result, Err(GatewayError::InvalidLevel(_))));
    }

    #[test]
    fn missing_level_defaults_to_error() {
        let Ok(event) = ErrorEvent::from_submission(
            NewError {
                level: None,
                message: "boom".to_string(),
                source: "backend".to_string(),
                ..NewError::default()
            },
            ClientMeta::default(),
        ) else {
            panic!("valid submission rejected");
        };
        assert_eq!(event.level, ErrorLevel::Error);
    }

    #[test]
    fn client_meta_is_attached_server_side() {
        let meta = ClientMeta {
            user_agent: Some("curl/8.0".to_string()),
            ip_address: Some("10.0.0.1".to_string()),
        };
        let Ok(event) = ErrorEvent::from_submission(submission(), meta) else {
            panic!("valid submission rejected");
        };
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(event.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn level_round_trips_through_strings() {
        for level in [
            ErrorLevel::Error,
            ErrorLevel::Warning,
            ErrorLevel::Info,
            ErrorLevel::Debug,
        ] {
            let parsed: Result<ErrorLevel, _> = level.as_str().parse();
            assert_eq!(parsed.ok(), Some(level));
        }
    }
}
