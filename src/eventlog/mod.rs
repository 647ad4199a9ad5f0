//! Administrative event log
//!
//! A bounded buffer of structured entries (oldest evicted first) that any
//! number of subscribers can replay and then follow live.

pub mod buffer;
pub mod types;

pub use buffer::{EventLog, Subscription, DEFAULT_CAPACITY};
pub use types::{mask_detail, LogContext, LogEntry, LogLevel};
