//! Transfer endpoint
//!
//! One actor task per endpoint owns its receive tracker, its sender session
//! and its delivery simulator, and handles inbound data messages and local
//! commands strictly one at a time.

mod endpoint;
mod error;
mod types;

pub use endpoint::{
    connect_framed_pair, connect_pair, EndpointHandle, SpawnedEndpoint, TransferEndpoint,
};
pub use error::{CoordinatorError, CoordinatorResult};
pub use types::{EndpointConfig, EndpointEvent, TransferTicket};
