//! JSON text framing for the peer data channel
//!
//! Real peer transports carry one text frame per data message. Outgoing
//! messages are encoded on send; incoming frames are decoded by a small task
//! that drops anything that is not a data message.

use tokio::sync::mpsc;

use super::simulator::DataChannel;
use crate::metrics;
use crate::protocol::DataMessage;

/// [`DataChannel`] that writes each message as one JSON text frame
#[derive(Debug, Clone)]
pub struct TextChannel {
    frames: mpsc::UnboundedSender<String>,
}

impl TextChannel {
    pub fn new(frames: mpsc::UnboundedSender<String>) -> Self {
        Self { frames }
    }
}

impl DataChannel for TextChannel {
    fn send(&self, message: DataMessage) -> bool {
        match message.encode() {
            Ok(text) => self.frames.send(text).is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode data message");
                false
            }
        }
    }
}

/// Decode incoming text frames into data messages.
///
/// Frames that do not parse are dropped. The returned receiver closes once
/// `frames` does.
pub fn spawn_decoder(
    mut frames: mpsc::UnboundedReceiver<String>,
) -> mpsc::UnboundedReceiver<DataMessage> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(text) = frames.recv().await {
            match DataMessage::decode(&text) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::trace!(error = %e, len = text.len(), "dropping malformed data frame");
                    metrics::record_frame_dropped();
                }
            }
        }
    });

    rx
}
