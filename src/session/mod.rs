//! Transfer sessions
//!
//! A receiving session moves from `Collecting` to `Complete` exactly once. A
//! sending session keeps the chunks of its payload for retransmission.

pub mod receiver;
pub mod sender;
pub mod types;

pub use receiver::{Arrival, ReceiveTracker, ReceiverSession};
pub use sender::SenderSession;
pub use types::{ProgressReport, ReceiveOutcome, SessionState};
