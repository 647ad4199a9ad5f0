//! In-process link simulation shared by the integration and stress tests
//!
//! Endpoints are wired through plain channels. The sending side can be wrapped
//! in a tampering link that corrupts or duplicates packets after the delivery
//! simulator has applied delay and loss. Room members additionally talk to an
//! in-process relay and exchange their data as text frames.

pub mod harness;
pub mod network_profile;
pub mod tampering_channel;

#[allow(unused_imports)]
pub use harness::{
    deliver_with_retries, spawn_linked, spawn_member, wait_for_client_event, wait_for_completion,
    wait_for_delivery, LinkedPair, Switchboard,
};
#[allow(unused_imports)]
pub use network_profile::NetworkProfile;
#[allow(unused_imports)]
pub use tampering_channel::{TamperConfig, TamperStats, TamperingChannel};
