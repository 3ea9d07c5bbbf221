//! Request-level error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The tenant has no resolvable warehouse configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The warehouse (or another upstream) answered with an error or was unreachable
    #[error("upstream fetch failed{}: {message}", status_suffix(.status))]
    UpstreamFetch {
        status: Option<u16>,
        message: String,
    },

    /// The token endpoint was unreachable or returned no access token
    #[error("auth token error: {0}")]
    Auth(String),

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("missing caller identity")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl DashboardError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            status,
            message: message.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UpstreamFetch { .. } => "upstream",
            Self::Auth(_) => "auth",
            Self::InvalidRange(_) => "invalid_range",
            Self::Unauthenticated => "unauthenticated",
            Self::Database(_) => "database",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFetch { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidRange(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            tracing::warn!(kind = self.kind(), "Request rejected: {}", self);
        }

        let mut body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        if let Self::UpstreamFetch {
            status: Some(upstream),
            ..
        } = &self
        {
            body["upstream_status"] = json!(upstream);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_preserved_when_it_is_an_error() {
        let err = DashboardError::upstream(Some(403), "forbidden");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "upstream fetch failed with status 403: forbidden");

        let err = DashboardError::upstream(Some(200), "body did not parse");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = DashboardError::upstream(None, "connection refused");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "upstream fetch failed: connection refused");
    }

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(DashboardError::Configuration("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DashboardError::Auth("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(DashboardError::InvalidRange("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DashboardError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    }
}
