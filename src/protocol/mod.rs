//! Wire messages
//!
//! Control-plane messages travel between endpoints and the relay service;
//! data-plane messages travel over the (unreliable) peer channel. Both are
//! JSON text, one message per frame.

pub mod control;
pub mod data;
pub mod error;

pub use control::{ClientMessage, PeerId, ServerMessage};
pub use data::{DataMessage, NackFrame, PacketFrame, ProgressFrame, ProgressStatus};
pub use error::{ProtocolError, ProtocolResult};
