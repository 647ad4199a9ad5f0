//! Relay client
//!
//! Connects a transfer endpoint to the rendezvous service: joins a room,
//! follows the counterpart coming and going, and mirrors NACKs, link status
//! and simulator settings to the relay.

mod error;
mod relay_client;
mod types;

pub use error::{ClientError, ClientResult};
pub use relay_client::{ClientHandle, RelayClient, SpawnedClient};
pub use types::{ClientEvent, ControlLink};
