use tokio::sync::mpsc;

use crate::coordinator::EndpointEvent;
use crate::network::SimulatorConfig;
use crate::protocol::{PeerId, ServerMessage};

/// Text-frame connection to the relay service, one control message per frame
#[derive(Debug)]
pub struct ControlLink {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<String>,
}

pub(crate) enum ClientCommand {
    Join { room_id: String },
    Leave,
    Conditions(SimulatorConfig),
}

/// What a relay client observed, in the order it handled it
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Admitted to a room; `peers` includes this client
    Joined { peer_id: PeerId, peers: Vec<PeerId> },
    PeerJoined(PeerId),
    /// The counterpart left; the endpoint has been reset
    PeerLeft(PeerId),
    RoomFull,
    /// Signal, NACK, status or settings message relayed from the counterpart
    Relayed(ServerMessage),
    Endpoint(EndpointEvent),
    /// The relay closed the connection
    Disconnected,
}
