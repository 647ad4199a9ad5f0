use std::collections::BTreeMap;

use crate::chunk::{self, Chunk};
use crate::session::types::{ProgressReport, ReceiveOutcome, SessionState};

/// Chunks collected for one incoming transfer
#[derive(Debug)]
pub struct ReceiverSession {
    correlation_id: String,
    generation: u64,
    total: u32,
    received: BTreeMap<u32, Chunk>,
    duplicates: u64,
    state: SessionState,
}

impl ReceiverSession {
    pub fn new(correlation_id: impl Into<String>, total: u32, generation: u64) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            generation,
            total,
            received: BTreeMap::new(),
            duplicates: 0,
            state: SessionState::Collecting,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn contains(&self, sequence: u32) -> bool {
        self.received.contains_key(&sequence)
    }

    fn belongs(&self, chunk: &Chunk, generation: u64) -> bool {
        self.correlation_id == chunk.correlation_id
            && self.total == chunk.total
            && self.generation == generation
    }

    /// Store a chunk and re-evaluate the session.
    ///
    /// The first arrival of a sequence wins, except that an intact copy
    /// replaces a stored copy that failed its checksum. That exception is a
    /// deliberate extension over plain first-arrival: without it a `bad`
    /// sequence could never be repaired by retransmission.
    pub fn insert(&mut self, chunk: Chunk) -> Arrival {
        let mut duplicate = false;
        match self.received.get(&chunk.sequence) {
            None => {
                self.received.insert(chunk.sequence, chunk);
            }
            Some(stored) if !stored.is_intact() && chunk.is_intact() => {
                self.received.insert(chunk.sequence, chunk);
            }
            Some(_) => {
                self.duplicates += 1;
                duplicate = true;
            }
        }

        let diagnosis = chunk::diagnose(self.received.values());
        let report = ProgressReport::from_diagnosis(&self.correlation_id, &diagnosis);

        let outcome = if self.state.is_complete() {
            ReceiveOutcome::AlreadyComplete { report }
        } else if diagnosis.is_complete() {
            self.state = SessionState::Complete;
            ReceiveOutcome::Completed {
                payload: chunk::join(self.received.values()),
                report,
            }
        } else {
            ReceiveOutcome::Pending {
                nack: diagnosis.needed(),
                report,
            }
        };

        Arrival { duplicate, outcome }
    }

    /// Current view without inserting anything
    pub fn report(&self) -> ProgressReport {
        let diagnosis = chunk::diagnose(self.received.values());
        ProgressReport::from_diagnosis(&self.correlation_id, &diagnosis)
    }
}

/// Result of handing one chunk to a [`ReceiveTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    /// The sequence was already stored and the new copy was ignored
    pub duplicate: bool,
    pub outcome: ReceiveOutcome,
}

/// Owns the receiving side of an endpoint: at most one active session
#[derive(Debug, Default)]
pub struct ReceiveTracker {
    session: Option<ReceiverSession>,
}

impl ReceiveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&ReceiverSession> {
        self.session.as_ref()
    }

    /// Drop the active session, e.g. when switching rooms
    pub fn reset(&mut self) {
        self.session = None;
    }

    /// Route a chunk to the active session, starting a fresh one when the
    /// chunk belongs to a different transfer.
    ///
    /// Chunks whose generation is older than the active session's are stale
    /// leftovers of a superseded transfer and are discarded untouched. Every
    /// transfer has its own correlation id, so the comparison spans ids;
    /// generations are only ordered per counterpart, and a new counterpart
    /// must be preceded by [`reset`](Self::reset).
    pub fn accept(&mut self, chunk: Chunk, generation: u64) -> Arrival {
        if let Some(active) = &self.session {
            if generation < active.generation() {
                return Arrival {
                    duplicate: false,
                    outcome: ReceiveOutcome::Stale,
                };
            }
        }

        let session = match self.session.take() {
            Some(active) if active.belongs(&chunk, generation) => active,
            _ => {
                tracing::debug!(
                    correlation_id = %chunk.correlation_id,
                    total = chunk.total,
                    generation,
                    "starting receive session"
                );
                ReceiverSession::new(chunk.correlation_id.clone(), chunk.total, generation)
            }
        };

        self.session.insert(session).insert(chunk)
    }
}
