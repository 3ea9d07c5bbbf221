//! HTTP routes

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::AppState;
use crate::analytics::DashboardAggregate;
use crate::dates::RangeSpec;
use crate::error::{DashboardError, DashboardResult};

/// Header carrying the caller identity asserted by the auth layer in front of us
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// 24h | 7d | 30d | ytd | 1y | ly
    pub range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn caller_identity(headers: &HeaderMap) -> DashboardResult<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(DashboardError::Unauthenticated)
}

/// Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// API: Get the dashboard aggregates for the caller's project (never cached)
pub async fn api_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> DashboardResult<Json<DashboardAggregate>> {
    let user = caller_identity(&headers)?;
    let range = RangeSpec::from_parts(
        query.range.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )?;

    let data = state.dashboard.get_table_data(&user, &range).await?;
    Ok(Json(data))
}
