//! Bit Messenger
//!
//! Short text messages cut into numbered, checksummed chunks and carried over
//! an unreliable peer-to-peer link. The receiver recovers from loss and
//! corruption by naming what it still needs (NACK) until the payload is
//! complete. A small rendezvous service pairs the two endpoints in a room and
//! relays their signaling, with an administrative event log on the side.

pub mod api;
pub mod chunk;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod eventlog;
pub mod metrics;
pub mod network;
pub mod protocol;
pub mod relay;
pub mod session;
