use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::error::ProtocolResult;

/// Identity the relay service assigns to a connection when it joins a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages an endpoint sends to the relay service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// Opaque transport-negotiation payload (offer/answer/candidate)
    Signal {
        #[serde(default)]
        data: Value,
    },
    Nack {
        #[serde(default)]
        seqs: Vec<u32>,
    },
    DcStatus {
        #[serde(default)]
        data: Value,
    },
    /// Simulator settings changed on the sending side; informational only
    Slider {
        #[serde(default)]
        data: Value,
    },
}

impl ClientMessage {
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::Signal { .. } => "signal",
            ClientMessage::Nack { .. } => "nack",
            ClientMessage::DcStatus { .. } => "dc-status",
            ClientMessage::Slider { .. } => "slider",
        }
    }

    /// Tag a relayable message with its sender. `join` is never relayed.
    pub fn relayed(self, from: PeerId) -> Option<ServerMessage> {
        match self {
            ClientMessage::Join { .. } => None,
            ClientMessage::Signal { data } => Some(ServerMessage::Signal { from, data }),
            ClientMessage::Nack { seqs } => Some(ServerMessage::Nack { from, seqs }),
            ClientMessage::DcStatus { data } => Some(ServerMessage::DcStatus { from, data }),
            ClientMessage::Slider { data } => Some(ServerMessage::Slider { from, data }),
        }
    }

    /// Summary recorded in the event log; never the full negotiation payload
    pub fn log_detail(&self) -> Value {
        match self {
            ClientMessage::Join { room_id } => json!({ "roomId": room_id }),
            ClientMessage::Signal { data } => json!({ "kind": data.get("kind") }),
            ClientMessage::Nack { seqs } => json!({ "seqs": seqs }),
            ClientMessage::DcStatus { data } | ClientMessage::Slider { data } => data.clone(),
        }
    }
}

/// Messages the relay service sends to an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Joined {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        peers: Vec<PeerId>,
    },
    PeerJoined {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    PeerLeft {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    RoomFull,
    Signal {
        from: PeerId,
        data: Value,
    },
    Nack {
        from: PeerId,
        seqs: Vec<u32>,
    },
    DcStatus {
        from: PeerId,
        data: Value,
    },
    Slider {
        from: PeerId,
        data: Value,
    },
}

impl ServerMessage {
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Sender of a relayed message
    pub fn from(&self) -> Option<&PeerId> {
        match self {
            ServerMessage::Signal { from, .. }
            | ServerMessage::Nack { from, .. }
            | ServerMessage::DcStatus { from, .. }
            | ServerMessage::Slider { from, .. } => Some(from),
            _ => None,
        }
    }
}
