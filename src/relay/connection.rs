use tokio::sync::mpsc;

use super::types::{ConnectionId, Outbound};
use crate::protocol::ServerMessage;

/// Sending half of a client connection.
///
/// Sends are pushes onto an unbounded queue drained by the connection's
/// writer task, so they never block while a room is locked. A connection is
/// open until that writer goes away.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::next(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, message: ServerMessage) -> bool {
        self.tx.send(Outbound::Message(message)).is_ok()
    }

    /// Ask the writer to close the socket with `code` after flushing what is queued
    pub fn close(&self, code: u16, reason: impl Into<String>) -> bool {
        self.tx
            .send(Outbound::Close {
                code,
                reason: reason.into(),
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_close_are_queued_in_order() {
        let (conn, mut rx) = Connection::new();
        assert!(conn.send(ServerMessage::RoomFull));
        assert!(conn.close(1008, "room full"));

        assert_eq!(rx.try_recv().unwrap(), Outbound::Message(ServerMessage::RoomFull));
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Close {
                code: 1008,
                reason: "room full".into()
            }
        );
    }

    #[test]
    fn test_closed_when_writer_gone() {
        let (conn, rx) = Connection::new();
        assert!(conn.is_open());
        drop(rx);
        assert!(!conn.is_open());
        assert!(!conn.send(ServerMessage::RoomFull));
    }
}
