use serde_json::json;
use tokio::sync::mpsc;

use super::websocket::handle_text;
use super::AppState;
use crate::client::ControlLink;
use crate::eventlog::LogContext;
use crate::relay::{Connection, Outbound};

/// Open a relay connection inside the process.
///
/// Frames are handled exactly like WebSocket text frames. Dropping the
/// returned link's sender closes the connection and leaves its room; a close
/// from the relay (room full) ends the link's receiver.
pub fn connect_local(state: AppState) -> ControlLink {
    let (outgoing, mut from_client) = mpsc::unbounded_channel::<String>();
    let (to_client, incoming) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (connection, mut outbound) = Connection::new();
        let id = connection.id().value();
        state
            .log
            .info(LogContext::new("link-open").detail(json!({ "connection": id })));

        loop {
            tokio::select! {
                frame = from_client.recv() => match frame {
                    Some(text) => handle_text(&state, &connection, &text),
                    None => break,
                },
                Some(frame) = outbound.recv() => match frame {
                    Outbound::Message(message) => match message.encode() {
                        Ok(text) => {
                            if to_client.send(text).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to encode server message"),
                    },
                    Outbound::Close { code, reason } => {
                        tracing::debug!(connection = %connection.id(), code, reason = %reason, "closing local link");
                        break;
                    }
                },
            }
        }

        state.rooms.leave(&connection, "close");
        state
            .log
            .info(LogContext::new("link-close").detail(json!({ "connection": id })));
    });

    ControlLink { outgoing, incoming }
}
