use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::ProtocolResult;
use crate::chunk::{Chunk, ChunkError};
use crate::session::ProgressReport;

/// Messages exchanged directly between the two endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum DataMessage {
    #[serde(rename = "pkt")]
    Packet(PacketFrame),
    #[serde(rename = "nack")]
    Nack(NackFrame),
    #[serde(rename = "progress")]
    Progress(ProgressFrame),
}

impl DataMessage {
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A chunk on the wire, payload hex-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketFrame {
    pub correlation_id: String,
    #[serde(default)]
    pub generation: u64,
    pub sequence: u32,
    pub total: u32,
    pub payload_length: usize,
    pub checksum: u8,
    pub payload: String,
}

impl PacketFrame {
    pub fn from_chunk(chunk: &Chunk, generation: u64) -> Self {
        Self {
            correlation_id: chunk.correlation_id.clone(),
            generation,
            sequence: chunk.sequence,
            total: chunk.total,
            payload_length: chunk.payload_length,
            checksum: chunk.checksum,
            payload: hex::encode(&chunk.payload),
        }
    }

    /// Decode back into a chunk. The checksum is carried as declared, so a
    /// tampered payload surfaces later as a `bad` sequence.
    pub fn into_chunk(self) -> Result<Chunk, ChunkError> {
        if self.sequence == 0 || self.total == 0 || self.sequence > self.total {
            return Err(ChunkError::InvalidSequence {
                sequence: self.sequence,
                total: self.total,
            });
        }

        let payload = hex::decode(&self.payload)?;
        Ok(Chunk {
            correlation_id: self.correlation_id,
            sequence: self.sequence,
            total: self.total,
            payload_length: self.payload_length,
            checksum: self.checksum,
            payload: Bytes::from(payload),
        })
    }
}

/// Receiver's request for the sequences it still needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NackFrame {
    #[serde(default)]
    pub seqs: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub total: u32,
    #[serde(default)]
    pub ok: Vec<u32>,
    #[serde(default)]
    pub bad: Vec<u32>,
    #[serde(default)]
    pub missing: Vec<u32>,
}

impl ProgressFrame {
    pub fn from_report(report: &ProgressReport, generation: u64) -> Self {
        Self {
            correlation_id: report.correlation_id.clone(),
            generation: Some(generation),
            status: ProgressStatus {
                total: report.total,
                ok: report.ok.clone(),
                bad: report.bad.clone(),
                missing: report.missing.clone(),
            },
        }
    }

    pub fn into_report(self) -> ProgressReport {
        ProgressReport {
            correlation_id: self.correlation_id,
            total: self.status.total,
            ok: self.status.ok,
            bad: self.status.bad,
            missing: self.status.missing,
        }
    }
}
