use std::collections::BTreeSet;
use std::time::Instant;

use crate::chunk::Chunk;
use crate::session::types::ProgressReport;

/// Outgoing transfer: the chunks of the last split payload, kept verbatim so
/// retransmissions carry identical checksums.
#[derive(Debug)]
pub struct SenderSession {
    correlation_id: String,
    generation: u64,
    chunks: Vec<Chunk>,
    started_at: Instant,
    retransmitted: u64,
    last_report: Option<ProgressReport>,
}

impl SenderSession {
    pub fn new(correlation_id: impl Into<String>, generation: u64, mut chunks: Vec<Chunk>) -> Self {
        chunks.sort_by_key(|c| c.sequence);
        Self {
            correlation_id: correlation_id.into(),
            generation,
            chunks,
            started_at: Instant::now(),
            retransmitted: 0,
            last_report: None,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn total(&self) -> u32 {
        self.chunks.len() as u32
    }

    pub fn retransmitted(&self) -> u64 {
        self.retransmitted
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn last_report(&self) -> Option<&ProgressReport> {
        self.last_report.as_ref()
    }

    /// Whether a NACK or progress report tagged with these identifiers is
    /// about this transfer. Absent identifiers match anything.
    pub fn owns(&self, correlation_id: Option<&str>, generation: Option<u64>) -> bool {
        correlation_id.map_or(true, |id| id == self.correlation_id)
            && generation.map_or(true, |g| g == self.generation)
    }

    /// Retained chunks named by a NACK, each at most once, in sequence order.
    /// Sequences this transfer never had are ignored.
    pub fn select(&mut self, seqs: &[u32]) -> Vec<Chunk> {
        let wanted: BTreeSet<u32> = seqs.iter().copied().collect();
        let selected: Vec<Chunk> = self
            .chunks
            .iter()
            .filter(|c| wanted.contains(&c.sequence))
            .cloned()
            .collect();
        self.retransmitted += selected.len() as u64;
        selected
    }

    /// Remember the receiver's latest view; returns true once it reports completion
    pub fn observe(&mut self, report: ProgressReport) -> bool {
        let complete = report.is_complete();
        self.last_report = Some(report);
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::split;

    fn session() -> SenderSession {
        let chunks = split(&[1u8; 50], 10, "out").unwrap();
        SenderSession::new("out", 3, chunks)
    }

    #[test]
    fn test_select_exact_chunks() {
        let mut sender = session();
        let original = sender.chunks().to_vec();

        let selected = sender.select(&[4, 2, 2, 9]);
        let seqs: Vec<u32> = selected.iter().map(|c| c.sequence).collect();
        assert_eq!(seqs, vec![2, 4]);
        assert_eq!(selected[0], original[1]);
        assert_eq!(selected[1], original[3]);
        assert_eq!(sender.retransmitted(), 2);
    }

    #[test]
    fn test_select_nothing() {
        let mut sender = session();
        assert!(sender.select(&[]).is_empty());
        assert!(sender.select(&[0, 6]).is_empty());
        assert_eq!(sender.retransmitted(), 0);
    }

    #[test]
    fn test_owns() {
        let sender = session();
        assert!(sender.owns(None, None));
        assert!(sender.owns(Some("out"), None));
        assert!(sender.owns(Some("out"), Some(3)));
        assert!(!sender.owns(Some("other"), None));
        assert!(!sender.owns(Some("out"), Some(2)));
        assert!(!sender.owns(None, Some(4)));
    }

    #[test]
    fn test_observe_completion() {
        let mut sender = session();
        let pending = ProgressReport {
            correlation_id: "out".into(),
            total: 5,
            ok: vec![1, 2],
            bad: vec![],
            missing: vec![3, 4, 5],
        };
        assert!(!sender.observe(pending.clone()));
        assert_eq!(sender.last_report(), Some(&pending));

        let done = ProgressReport {
            ok: vec![1, 2, 3, 4, 5],
            missing: vec![],
            ..pending
        };
        assert!(sender.observe(done));
        assert_eq!(sender.total(), 5);
    }
}
