use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::coordinator::error::{CoordinatorError, CoordinatorResult};
use crate::network::SimulatorConfig;
use crate::session::ProgressReport;

/// Per-endpoint transfer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Maximum payload bytes per chunk
    pub chunk_size: usize,
    /// Conditions applied to outgoing chunks
    pub simulator: SimulatorConfig,
    /// Gap between chunks of a first transmission
    pub pacing: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            chunk_size: 12,
            simulator: SimulatorConfig::default(),
            pacing: Duration::from_millis(120),
        }
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> CoordinatorResult<()> {
        if self.chunk_size == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "chunk size must be at least 1".into(),
            ));
        }
        self.simulator.validate()?;
        Ok(())
    }
}

/// Identifies a transfer started by [`EndpointHandle::send_payload`](super::EndpointHandle::send_payload)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTicket {
    pub correlation_id: String,
    pub generation: u64,
    pub total: u32,
}

pub(crate) enum EndpointCommand {
    Send {
        payload: Bytes,
        reply: oneshot::Sender<CoordinatorResult<TransferTicket>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// What an endpoint observed, in the order it handled it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    /// A new outgoing transfer replaced the previous one
    TransferStarted(TransferTicket),
    /// A chunk reached the receiving session
    ChunkArrived {
        correlation_id: String,
        sequence: u32,
        intact: bool,
        duplicate: bool,
    },
    /// Chunk from a superseded transfer, discarded
    StaleDiscarded {
        correlation_id: String,
        generation: u64,
    },
    /// Data message that could not be decoded into a chunk
    MalformedDropped { reason: String },
    /// This endpoint asked its counterpart for missing or bad sequences
    NackSent {
        correlation_id: String,
        seqs: Vec<u32>,
    },
    /// The counterpart asked for sequences and they were re-submitted
    Retransmitting {
        correlation_id: String,
        seqs: Vec<u32>,
    },
    /// The counterpart reported progress on this endpoint's outgoing transfer
    ProgressObserved(ProgressReport),
    /// The counterpart holds every chunk of this endpoint's outgoing transfer
    Delivered {
        correlation_id: String,
        elapsed: Duration,
        retransmitted: u64,
    },
    /// An incoming transfer was reassembled
    Completed {
        correlation_id: String,
        payload: Bytes,
    },
}
