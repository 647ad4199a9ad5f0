use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::api::AppState;
use crate::eventlog::LogContext;
use crate::protocol::ClientMessage;
use crate::relay::{Connection, Outbound, RelayError};

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (connection, mut outbound) = Connection::new();
    state
        .log
        .info(LogContext::new("ws-open").detail(serde_json::json!({ "connection": connection.id().value() })));

    let (mut sink, mut stream) = socket.split();

    // Room sends never touch the socket directly; this task owns the write half
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match frame {
                Outbound::Message(message) => {
                    let text = match message.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode server message");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close { code, reason } => {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    });

    let mut reason = "close";
    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_text(&state, &connection, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(connection = %connection.id(), error = %e, "websocket error");
                    reason = "error";
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    state.rooms.leave(&connection, reason);
    writer.abort();
    state
        .log
        .info(LogContext::new("ws-close").detail(serde_json::json!({ "connection": connection.id().value() })));
}

/// Dispatch one text frame from a client. Frames that are not valid control
/// messages are dropped.
pub(crate) fn handle_text(state: &AppState, connection: &Connection, text: &str) {
    let message = match ClientMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::trace!(connection = %connection.id(), error = %e, "dropping malformed control message");
            return;
        }
    };

    match message {
        ClientMessage::Join { room_id } => match state.rooms.join(connection, &room_id) {
            Ok(peer_id) => {
                state
                    .log
                    .info(LogContext::new("join").room(&room_id).peer(&peer_id));
            }
            Err(RelayError::InvalidRoomId(id)) => {
                tracing::debug!(connection = %connection.id(), room_id = %id, "join with invalid room id");
            }
            // Already answered and logged by the room manager
            Err(RelayError::RoomFull(_)) => {}
        },
        other => {
            state.rooms.relay(connection, other);
        }
    }
}
