//! Error-event DTOs for submit, list, and stats operations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ErrorEvent, NewError};

/// Request body for `POST /errors`.
///
/// `user_agent` and `ip_address` are deliberately absent: they are captured
/// from the transport layer and never trusted from the payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitErrorRequest {
    /// Severity level (`error`, `warning`, `info`, `debug`). Defaults to
    /// `error` when omitted.
    #[serde(default)]
    pub level: Option<String>,
    /// Error message, required non-empty.
    #[serde(default)]
    pub message: String,
    /// Optional stack trace.
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Arbitrary structured metadata.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
    /// Originating application or component, required non-empty.
    #[serde(default)]
    pub source: String,
    /// Deployment environment tag. Defaults to `production` when omitted.
    #[serde(default)]
    pub environment: Option<String>,
    /// URL the error occurred on.
    #[serde(default)]
    pub url: Option<String>,
}

impl From<SubmitErrorRequest> for NewError {
    fn from(req: SubmitErrorRequest) -> Self {
        Self {
            level: req.level,
            message: req.message,
            stack_trace: req.stack_trace,
            context: req.context,
            source: req.source,
            environment: req.environment,
            url: req.url,
        }
    }
}

/// Query parameters for `GET /errors`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ErrorListParams {
    /// Page size (max 100). Defaults to 50.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of events to skip. Defaults to 0.
    #[serde(default)]
    pub offset: i64,
    /// Optional severity filter.
    #[serde(default)]
    pub level: Option<String>,
    /// Optional source filter.
    #[serde(default)]
    pub source: Option<String>,
}

fn default_limit() -> i64 {
    50
}

impl ErrorListParams {
    /// Clamps `limit` to 1..=100 and `offset` to non-negative, and drops
    /// empty filter strings.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, 100),
            offset: self.offset.max(0),
            level: self.level.clone().filter(|l| !l.is_empty()),
            source: self.source.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Query parameters for `GET /errors/recent`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RecentParams {
    /// Maximum ring entries to return (max 100). Defaults to 20.
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

fn default_recent_limit() -> usize {
    20
}

impl RecentParams {
    /// Clamps `limit` to 1..=100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, 100),
        }
    }
}

/// Response body for `GET /errors`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorListResponse {
    /// One page of events, newest first.
    pub errors: Vec<ErrorEvent>,
    /// Total events matching the filters. Approximated as
    /// `page length + offset` when the page was served from cache.
    pub total: i64,
    /// 1-indexed page number derived from offset and limit.
    pub page: i64,
    /// Page size used for this response.
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_bounds_limit_and_offset() {
        let params = ErrorListParams {
            limit: 5000,
            offset: -3,
            level: Some(String::new()),
            source: Some("api".to_string()),
        };
        let clamped = params.clamped();
        assert_eq!(clamped.limit, 100);
        assert_eq!(clamped.offset, 0);
        assert_eq!(clamped.level, None);
        assert_eq!(clamped.source.as_deref(), Some("api"));
    }

    #[test]
    fn defaults_apply_on_empty_query() {
        let params: ErrorListParams = serde_json::from_str("{}").unwrap_or(ErrorListParams {
            limit: 0,
            offset: 0,
            level: None,
            source: None,
        });
        assert_eq!(params.limit, 50);
        assert_eq!(params.offset, 0);
    }
}
