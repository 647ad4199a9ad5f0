//! Relay types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub use crate::protocol::PeerId;
use crate::protocol::ServerMessage;

/// Hard cap on participants per room
pub const MAX_OCCUPANTS: usize = 2;

/// WebSocket close code used to reject a join into a full room
pub const POLICY_VIOLATION: u16 = 1008;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Relay-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Room is full: {0}")]
    RoomFull(String),

    #[error("Invalid room id: {0:?}")]
    InvalidRoomId(String),
}

/// Process-unique handle for one client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Frames queued for a connection's writer
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(ServerMessage),
    Close { code: u16, reason: String },
}

/// Point-in-time view of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub peers: Vec<PeerId>,
}

impl RoomSnapshot {
    pub fn is_full(&self) -> bool {
        self.peers.len() >= MAX_OCCUPANTS
    }
}
