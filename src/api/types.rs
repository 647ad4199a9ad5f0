use serde::{Deserialize, Serialize};

use crate::eventlog::LogEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub rooms: usize,
    pub log_entries: usize,
    pub log_subscribers: usize,
}

/// Query string of `GET /admin/logs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    /// Minimum level: info, warn or error
    pub level: Option<String>,
    /// Most recent entries to return
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub capacity: usize,
    pub count: usize,
    pub entries: Vec<LogEntry>,
}
