//! Rendezvous and relay service
//!
//! Rooms hold at most two participants. The service assigns each participant
//! a peer id and forwards signaling and control messages between the two,
//! never back to the sender.

pub mod connection;
pub mod rooms;
pub mod types;

pub use connection::Connection;
pub use rooms::RoomManager;
pub use types::{
    ConnectionId, Outbound, PeerId, RelayError, RelayResult, RoomSnapshot, MAX_OCCUPANTS,
    POLICY_VIOLATION,
};
