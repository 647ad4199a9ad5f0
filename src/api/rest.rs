use axum::extract::{Query, State};
use axum::Json;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{HealthResponse, LogsQuery, LogsResponse};
use crate::api::AppState;
use crate::eventlog::LogLevel;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        rooms: state.rooms.room_count(),
        log_entries: state.log.len(),
        log_subscribers: state.log.subscriber_count(),
    })
}

/// Snapshot of the event log, oldest first
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<LogsResponse>> {
    let level = query
        .level
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(str::parse::<LogLevel>)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;
    let limit = query.limit.unwrap_or_else(|| state.log.capacity());

    let entries = state.log.recent(level, limit);
    Ok(Json(LogsResponse {
        capacity: state.log.capacity(),
        count: entries.len(),
        entries,
    }))
}
