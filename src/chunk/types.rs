use bytes::Bytes;
use std::collections::BTreeMap;

use super::codec::checksum;

/// A numbered, checksummed slice of a payload.
///
/// Chunks are produced by [`split`](super::split) and never modified afterwards;
/// a retransmission re-sends the very same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub correlation_id: String,
    pub sequence: u32,
    pub total: u32,
    pub payload_length: usize,
    pub checksum: u8,
    pub payload: Bytes,
}

impl Chunk {
    /// Whether the declared length and checksum match the carried payload
    pub fn is_intact(&self) -> bool {
        self.payload_length == self.payload.len() && checksum(&self.payload) == self.checksum
    }
}

/// Result of inspecting a set of received chunks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    pub total: u32,
    pub missing: Vec<u32>,
    pub bad: Vec<u32>,
    /// First arrival per sequence number
    pub by_sequence: BTreeMap<u32, Chunk>,
}

impl Diagnosis {
    /// Every sequence 1..=total is present and intact
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.missing.is_empty() && self.bad.is_empty()
    }

    /// Present sequences whose checksum verified
    pub fn ok(&self) -> Vec<u32> {
        self.by_sequence
            .keys()
            .copied()
            .filter(|seq| self.bad.binary_search(seq).is_err())
            .collect()
    }

    /// Sorted union of missing and bad sequences, i.e. what a NACK asks for
    pub fn needed(&self) -> Vec<u32> {
        let mut needed: Vec<u32> = self.missing.iter().chain(&self.bad).copied().collect();
        needed.sort_unstable();
        needed.dedup();
        needed
    }
}
