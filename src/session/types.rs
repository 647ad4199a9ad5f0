use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::chunk::Diagnosis;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Collecting,
    Complete,
}

impl SessionState {
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionState::Complete)
    }
}

/// Receiver's view of a transfer, recomputed on every chunk arrival
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub correlation_id: String,
    pub total: u32,
    pub ok: Vec<u32>,
    pub bad: Vec<u32>,
    pub missing: Vec<u32>,
}

impl ProgressReport {
    pub fn from_diagnosis(correlation_id: &str, diagnosis: &Diagnosis) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            total: diagnosis.total,
            ok: diagnosis.ok(),
            bad: diagnosis.bad.clone(),
            missing: diagnosis.missing.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.missing.is_empty() && self.bad.is_empty()
    }

    pub fn progress_percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.ok.len() as f32 / self.total as f32 * 100.0
    }
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ok, missing {:?}, bad {:?}",
            self.ok.len(),
            self.total,
            self.missing,
            self.bad
        )
    }
}

/// How a receiving session reacted to one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The last needed chunk arrived; the payload is reassembled
    Completed {
        payload: Bytes,
        report: ProgressReport,
    },
    /// Still collecting; `nack` lists missing and bad sequences
    Pending {
        nack: Vec<u32>,
        report: ProgressReport,
    },
    /// Chunk for a session that already completed; nothing changed
    AlreadyComplete { report: ProgressReport },
    /// Chunk from an older generation than the active session
    Stale,
}

impl ReceiveOutcome {
    pub fn report(&self) -> Option<&ProgressReport> {
        match self {
            ReceiveOutcome::Completed { report, .. }
            | ReceiveOutcome::Pending { report, .. }
            | ReceiveOutcome::AlreadyComplete { report } => Some(report),
            ReceiveOutcome::Stale => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let report = ProgressReport {
            correlation_id: "r".into(),
            total: 4,
            ok: vec![1, 2, 3],
            bad: vec![],
            missing: vec![4],
        };
        assert_eq!(report.progress_percent(), 75.0);
        assert!(!report.is_complete());
        assert_eq!(ProgressReport::default().progress_percent(), 0.0);
    }

    #[test]
    fn test_report_display() {
        let report = ProgressReport {
            correlation_id: "r".into(),
            total: 3,
            ok: vec![1],
            bad: vec![3],
            missing: vec![2],
        };
        assert_eq!(report.to_string(), "1/3 ok, missing [2], bad [3]");
    }
}
