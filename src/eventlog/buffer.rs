use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::eventlog::types::{LogContext, LogEntry, LogLevel};

/// Entries retained when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 2000;

/// Live entries a slow subscriber may fall behind before it starts skipping
const BROADCAST_CAPACITY: usize = 256;

struct Inner {
    capacity: usize,
    buffer: Mutex<VecDeque<LogEntry>>,
    tx: broadcast::Sender<LogEntry>,
}

/// Bounded ring of log entries with live fan-out.
///
/// Cloning is cheap and every clone writes to the same buffer.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Inner>,
}

/// Replay of the buffer at subscription time plus everything recorded after it
pub struct Subscription {
    pub backlog: Vec<LogEntry>,
    pub live: broadcast::Receiver<LogEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                capacity,
                buffer: Mutex::new(VecDeque::with_capacity(capacity)),
                tx,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.buffer.lock().is_empty()
    }

    pub fn info(&self, context: LogContext) -> LogEntry {
        self.record(LogLevel::Info, context)
    }

    pub fn warn(&self, context: LogContext) -> LogEntry {
        self.record(LogLevel::Warn, context)
    }

    pub fn error(&self, context: LogContext) -> LogEntry {
        self.record(LogLevel::Error, context)
    }

    /// Append an entry, evicting the oldest when full, and push it to live
    /// subscribers.
    pub fn record(&self, level: LogLevel, context: LogContext) -> LogEntry {
        let entry = context.into_entry(level);
        trace_entry(&entry);

        // Subscribers take their backlog under the same lock, so an entry is
        // either in a backlog or on that subscriber's live channel, never both.
        let mut buffer = self.inner.buffer.lock();
        if buffer.len() == self.inner.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
        // No receivers is fine
        let _ = self.inner.tx.send(entry.clone());

        entry
    }

    /// Copy of the buffer, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.buffer.lock().iter().cloned().collect()
    }

    /// The most recent `limit` entries at or above `min_level`, oldest first
    pub fn recent(&self, min_level: Option<LogLevel>, limit: usize) -> Vec<LogEntry> {
        let buffer = self.inner.buffer.lock();
        let mut entries: Vec<LogEntry> = buffer
            .iter()
            .rev()
            .filter(|e| min_level.map_or(true, |level| e.level >= level))
            .take(limit)
            .cloned()
            .collect();
        entries.reverse();
        entries
    }

    pub fn subscribe(&self) -> Subscription {
        let buffer = self.inner.buffer.lock();
        let live = self.inner.tx.subscribe();
        Subscription {
            backlog: buffer.iter().cloned().collect(),
            live,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn trace_entry(entry: &LogEntry) {
    match entry.level {
        LogLevel::Info => tracing::info!(
            room_id = %entry.room_id,
            peer_id = %entry.peer_id,
            detail = %entry.detail,
            "{}",
            entry.event
        ),
        LogLevel::Warn => tracing::warn!(
            room_id = %entry.room_id,
            peer_id = %entry.peer_id,
            detail = %entry.detail,
            "{}",
            entry.event
        ),
        LogLevel::Error => tracing::error!(
            room_id = %entry.room_id,
            peer_id = %entry.peer_id,
            detail = %entry.detail,
            "{}",
            entry.event
        ),
    }
}
