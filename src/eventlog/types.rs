use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Detail keys whose string values are replaced by their length
const MASKED_KEYS: [&str; 3] = ["message", "payload", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub room_id: String,
    pub peer_id: String,
    pub event: String,
    pub detail: Value,
}

/// What to record; room and peer default to `"-"`
#[derive(Debug, Clone)]
pub struct LogContext {
    room_id: Option<String>,
    peer_id: Option<String>,
    event: String,
    detail: Value,
}

impl LogContext {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            room_id: None,
            peer_id: None,
            event: event.into(),
            detail: Value::Object(Map::new()),
        }
    }

    pub fn room(mut self, room_id: impl ToString) -> Self {
        self.room_id = Some(room_id.to_string());
        self
    }

    pub fn peer(mut self, peer_id: impl ToString) -> Self {
        self.peer_id = Some(peer_id.to_string());
        self
    }

    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    pub(crate) fn into_entry(self, level: LogLevel) -> LogEntry {
        LogEntry {
            ts: Utc::now(),
            level,
            room_id: self.room_id.unwrap_or_else(|| "-".to_string()),
            peer_id: self.peer_id.unwrap_or_else(|| "-".to_string()),
            event: self.event,
            detail: mask_detail(self.detail),
        }
    }
}

/// Replace transferred text with its length so it never lands in the log
pub fn mask_detail(detail: Value) -> Value {
    let Value::Object(mut map) = detail else {
        return detail;
    };

    for key in MASKED_KEYS {
        if let Some(Value::String(text)) = map.get(key) {
            let length = text.chars().count();
            map.remove(key);
            map.insert(format!("{key}Masked"), Value::Bool(true));
            map.insert(format!("{key}Length"), Value::from(length));
        }
    }

    Value::Object(map)
}
