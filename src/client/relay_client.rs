use serde_json::json;
use tokio::sync::mpsc;

use crate::client::error::{ClientError, ClientResult};
use crate::client::types::{ClientCommand, ClientEvent, ControlLink};
use crate::coordinator::{EndpointEvent, EndpointHandle, SpawnedEndpoint, TransferTicket};
use crate::network::SimulatorConfig;
use crate::protocol::{ClientMessage, PeerId, ServerMessage};

/// Endpoint-side half of the relay protocol.
///
/// Joins a room, tracks the counterpart, mirrors the endpoint's NACKs and
/// simulator settings to the relay so they show up in the administrative log,
/// and reports the data link as open or closed as counterparts come and go.
pub struct RelayClient {
    endpoint: EndpointHandle,
    control: Option<mpsc::UnboundedSender<String>>,
    peer_id: Option<PeerId>,
    counterpart: Option<PeerId>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

/// A running client: the handle to drive it and the stream of what it observed
pub struct SpawnedClient {
    pub handle: ClientHandle,
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

impl RelayClient {
    /// Start a client task owning `endpoint`'s event stream. Endpoint events
    /// are passed through as [`ClientEvent::Endpoint`].
    pub fn spawn(endpoint: SpawnedEndpoint, link: ControlLink) -> SpawnedClient {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let client = Self {
            endpoint: endpoint.handle.clone(),
            control: Some(link.outgoing),
            peer_id: None,
            counterpart: None,
            events: event_tx,
        };
        tokio::spawn(client.run(command_rx, link.incoming, endpoint.events));

        SpawnedClient {
            handle: ClientHandle {
                commands: command_tx,
                endpoint: endpoint.handle,
            },
            events: event_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ClientCommand>,
        mut incoming: mpsc::UnboundedReceiver<String>,
        mut endpoint_events: mpsc::UnboundedReceiver<EndpointEvent>,
    ) {
        let mut connected = true;
        loop {
            tokio::select! {
                Some(command) = commands.recv() => self.handle_command(command),
                frame = incoming.recv(), if connected => match frame {
                    Some(text) => self.handle_frame(&text).await,
                    None => {
                        connected = false;
                        self.disconnected();
                    }
                },
                Some(event) = endpoint_events.recv() => self.handle_endpoint_event(event),
                else => break,
            }
        }
        tracing::debug!("relay client stopped");
    }

    fn handle_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::Join { room_id } => {
                self.send_control(ClientMessage::Join { room_id });
            }
            ClientCommand::Leave => {
                // Closing the link is how the relay learns about a departure
                self.control = None;
                self.peer_id = None;
                self.counterpart = None;
            }
            ClientCommand::Conditions(config) => {
                self.send_control(ClientMessage::Slider {
                    data: json!({
                        "delayMs": config.delay_ms_base,
                        "loss": config.loss_probability,
                    }),
                });
            }
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::trace!(error = %e, "dropping malformed relay message");
                return;
            }
        };

        match message {
            ServerMessage::Joined { peer_id, peers } => {
                tracing::info!(peer_id = %peer_id, peers = peers.len(), "joined room");
                // A new room starts from clean sessions
                self.reset_endpoint().await;
                self.peer_id = Some(peer_id.clone());
                let counterpart = peers.iter().find(|p| **p != peer_id).cloned();
                self.emit(ClientEvent::Joined { peer_id, peers });
                if let Some(other) = counterpart {
                    self.counterpart_arrived(other);
                }
            }
            ServerMessage::PeerJoined { peer_id } => {
                self.counterpart_arrived(peer_id.clone());
                self.emit(ClientEvent::PeerJoined(peer_id));
            }
            ServerMessage::PeerLeft { peer_id } => {
                tracing::info!(peer_id = %peer_id, "counterpart left");
                if self.counterpart.as_ref() == Some(&peer_id) {
                    self.counterpart = None;
                }
                // The next counterpart numbers its generations from scratch
                self.reset_endpoint().await;
                self.send_control(ClientMessage::DcStatus {
                    data: json!({ "state": "closed" }),
                });
                self.emit(ClientEvent::PeerLeft(peer_id));
            }
            ServerMessage::RoomFull => {
                tracing::warn!("room is full");
                self.emit(ClientEvent::RoomFull);
            }
            relayed => {
                if let Some(from) = relayed.from() {
                    tracing::debug!(from = %from, "relayed message");
                }
                self.emit(ClientEvent::Relayed(relayed));
            }
        }
    }

    fn counterpart_arrived(&mut self, peer_id: PeerId) {
        tracing::info!(peer_id = %peer_id, "counterpart present");
        self.counterpart = Some(peer_id);
        self.send_control(ClientMessage::DcStatus {
            data: json!({ "state": "open" }),
        });
    }

    fn handle_endpoint_event(&mut self, event: EndpointEvent) {
        if let EndpointEvent::NackSent { seqs, .. } = &event {
            if self.peer_id.is_some() {
                self.send_control(ClientMessage::Nack { seqs: seqs.clone() });
            }
        }
        self.emit(ClientEvent::Endpoint(event));
    }

    async fn reset_endpoint(&self) {
        if let Err(e) = self.endpoint.reset().await {
            tracing::warn!(error = %e, "failed to reset endpoint");
        }
    }

    fn disconnected(&mut self) {
        tracing::info!("relay connection closed");
        self.control = None;
        self.peer_id = None;
        self.counterpart = None;
        self.emit(ClientEvent::Disconnected);
    }

    fn send_control(&self, message: ClientMessage) -> bool {
        let Some(control) = &self.control else {
            tracing::trace!(kind = message.kind(), "no relay connection, message dropped");
            return false;
        };
        match message.encode() {
            Ok(text) => control.send(text).is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode control message");
                false
            }
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

/// Cloneable handle for commanding a running client
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
    endpoint: EndpointHandle,
}

impl ClientHandle {
    pub fn join(&self, room_id: impl Into<String>) -> ClientResult<()> {
        self.command(ClientCommand::Join {
            room_id: room_id.into(),
        })
    }

    /// Close the relay connection; the relay then tells the counterpart
    pub fn leave(&self) -> ClientResult<()> {
        self.command(ClientCommand::Leave)
    }

    pub async fn send_text(&self, text: &str) -> ClientResult<TransferTicket> {
        Ok(self.endpoint.send_text(text).await?)
    }

    /// Apply new simulator settings and announce them to the room
    pub fn update_conditions(&self, config: SimulatorConfig) -> ClientResult<()> {
        self.endpoint.update_conditions(config)?;
        self.command(ClientCommand::Conditions(config))
    }

    pub fn endpoint(&self) -> &EndpointHandle {
        &self.endpoint
    }

    fn command(&self, command: ClientCommand) -> ClientResult<()> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::ClientClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{connect_pair, EndpointConfig};
    use serde_json::Value;

    struct Harness {
        client: SpawnedClient,
        to_client: mpsc::UnboundedSender<String>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    fn harness() -> Harness {
        let (endpoint, _other) =
            connect_pair(EndpointConfig::default(), EndpointConfig::default()).unwrap();
        let (outgoing, from_client) = mpsc::unbounded_channel();
        let (to_client, incoming) = mpsc::unbounded_channel();
        let client = RelayClient::spawn(endpoint, ControlLink { outgoing, incoming });
        Harness {
            client,
            to_client,
            from_client,
        }
    }

    fn server(message: ServerMessage) -> String {
        message.encode().unwrap()
    }

    async fn sent(h: &mut Harness) -> Value {
        serde_json::from_str(&h.from_client.recv().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_join_and_counterpart_opens_link() {
        let mut h = harness();
        h.client.handle.join("demo").unwrap();
        assert_eq!(sent(&mut h).await, json!({ "type": "join", "roomId": "demo" }));

        let me = PeerId::from("me");
        let other = PeerId::from("other");
        h.to_client
            .send(server(ServerMessage::Joined {
                peer_id: me.clone(),
                peers: vec![other.clone(), me.clone()],
            }))
            .unwrap();

        assert_eq!(
            h.client.events.recv().await.unwrap(),
            ClientEvent::Joined {
                peer_id: me.clone(),
                peers: vec![other, me],
            }
        );
        assert_eq!(
            sent(&mut h).await,
            json!({ "type": "dc-status", "data": { "state": "open" } })
        );
    }

    #[tokio::test]
    async fn test_peer_left_reports_closed_link() {
        let mut h = harness();
        let gone = PeerId::from("gone");
        h.to_client
            .send(server(ServerMessage::PeerJoined {
                peer_id: gone.clone(),
            }))
            .unwrap();
        h.to_client
            .send(server(ServerMessage::PeerLeft {
                peer_id: gone.clone(),
            }))
            .unwrap();

        assert_eq!(
            h.client.events.recv().await.unwrap(),
            ClientEvent::PeerJoined(gone.clone())
        );
        assert_eq!(
            h.client.events.recv().await.unwrap(),
            ClientEvent::PeerLeft(gone)
        );
        assert_eq!(sent(&mut h).await["data"]["state"], "open");
        assert_eq!(sent(&mut h).await["data"]["state"], "closed");
    }

    #[tokio::test]
    async fn test_relayed_and_malformed_frames() {
        let mut h = harness();
        h.to_client.send("garbage".to_string()).unwrap();
        let nack = ServerMessage::Nack {
            from: PeerId::from("other"),
            seqs: vec![4],
        };
        h.to_client.send(server(nack.clone())).unwrap();

        assert_eq!(h.client.events.recv().await.unwrap(), ClientEvent::Relayed(nack));
    }

    #[tokio::test]
    async fn test_conditions_announced() {
        let mut h = harness();
        h.client
            .handle
            .update_conditions(SimulatorConfig::new(80, 0.25).unwrap())
            .unwrap();

        assert_eq!(h.client.handle.endpoint().conditions().delay_ms_base, 80);
        assert_eq!(
            sent(&mut h).await,
            json!({ "type": "slider", "data": { "delayMs": 80, "loss": 0.25 } })
        );
    }

    #[tokio::test]
    async fn test_closed_link_reported() {
        let mut h = harness();
        drop(h.to_client);
        assert_eq!(h.client.events.recv().await.unwrap(), ClientEvent::Disconnected);

        // Nothing reaches a closed link
        h.client.handle.join("demo").unwrap();
        assert!(h.from_client.recv().await.is_none());
    }
}
