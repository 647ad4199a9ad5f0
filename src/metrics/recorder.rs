//! Metrics recorder for transfers and the relay service
//!
//! Records chunk traffic, NACK activity and room occupancy through the
//! `metrics` facade.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    // Chunk counters
    describe_counter!(
        "bitmsg_chunks_submitted_total",
        "Chunks handed to the delivery simulator"
    );
    describe_counter!(
        "bitmsg_chunks_lost_total",
        "Chunks dropped by the delivery simulator"
    );
    describe_counter!(
        "bitmsg_chunks_received_total",
        "Chunks accepted by a receiving session"
    );
    describe_counter!(
        "bitmsg_chunks_bad_total",
        "Received chunks that failed their checksum"
    );
    describe_counter!(
        "bitmsg_chunks_duplicate_total",
        "Received chunks whose sequence was already present"
    );
    describe_counter!(
        "bitmsg_chunks_retransmitted_total",
        "Chunks re-submitted in answer to a NACK"
    );
    describe_counter!("bitmsg_nacks_sent_total", "NACK requests sent by receivers");
    describe_counter!(
        "bitmsg_frames_malformed_total",
        "Data channel text frames dropped because they did not decode"
    );

    // Transfer counters
    describe_counter!("bitmsg_transfers_started_total", "Transfers started");
    describe_counter!("bitmsg_transfers_completed_total", "Transfers reassembled");

    // Relay
    describe_counter!(
        "bitmsg_messages_relayed_total",
        "Control messages forwarded between room occupants"
    );
    describe_counter!(
        "bitmsg_room_full_total",
        "Joins rejected because the room already had two occupants"
    );
    describe_gauge!("bitmsg_active_rooms", "Rooms with at least one occupant");

    describe_histogram!(
        "bitmsg_transfer_duration_seconds",
        "Time from first transmission to reassembly"
    );
}

// ============== Chunk Operations ==============

/// Record a chunk handed to the simulator (first transmission or retransmission)
pub fn record_chunk_submitted(correlation_id: &str) {
    counter!("bitmsg_chunks_submitted_total", "correlation_id" => correlation_id.to_string())
        .increment(1);
}

/// Record a chunk dropped by the simulator
pub fn record_chunk_lost(correlation_id: &str) {
    counter!("bitmsg_chunks_lost_total", "correlation_id" => correlation_id.to_string())
        .increment(1);
}

/// Record a chunk arriving at a receiving session
pub fn record_chunk_received(correlation_id: &str, intact: bool, duplicate: bool) {
    counter!("bitmsg_chunks_received_total", "correlation_id" => correlation_id.to_string())
        .increment(1);
    if !intact {
        counter!("bitmsg_chunks_bad_total").increment(1);
    }
    if duplicate {
        counter!("bitmsg_chunks_duplicate_total").increment(1);
    }
}

/// Record chunks re-submitted in answer to a NACK
pub fn record_retransmission(correlation_id: &str, chunks: usize) {
    counter!("bitmsg_chunks_retransmitted_total", "correlation_id" => correlation_id.to_string())
        .increment(chunks as u64);
}

/// Record a NACK request leaving a receiver
pub fn record_nack_sent(correlation_id: &str) {
    counter!("bitmsg_nacks_sent_total", "correlation_id" => correlation_id.to_string())
        .increment(1);
}

/// Record a data channel frame that did not decode
pub fn record_frame_dropped() {
    counter!("bitmsg_frames_malformed_total").increment(1);
}

// ============== Relay Operations ==============

/// Record a relayed control message
pub fn record_message_relayed(kind: &str) {
    counter!("bitmsg_messages_relayed_total", "kind" => kind.to_string()).increment(1);
}

/// Record a join rejected for capacity
pub fn record_room_full() {
    counter!("bitmsg_room_full_total").increment(1);
}

/// Update active room gauge
pub fn set_active_rooms(rooms: usize) {
    gauge!("bitmsg_active_rooms").set(rooms as f64);
}

/// Tracks one transfer from first transmission to reassembly
#[derive(Debug)]
pub struct TransferMetrics {
    correlation_id: String,
    start_time: Instant,
    bytes: u64,
}

impl TransferMetrics {
    /// Start tracking a new transfer
    pub fn start(correlation_id: impl Into<String>, bytes: u64) -> Self {
        let id = correlation_id.into();
        counter!("bitmsg_transfers_started_total").increment(1);

        Self {
            correlation_id: id,
            start_time: Instant::now(),
            bytes,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Mark the transfer as reassembled
    pub fn complete(self) -> Duration {
        let duration = self.start_time.elapsed();
        counter!("bitmsg_transfers_completed_total").increment(1);
        histogram!("bitmsg_transfer_duration_seconds").record(duration.as_secs_f64());
        tracing::debug!(
            correlation_id = %self.correlation_id,
            bytes = self.bytes,
            elapsed_ms = duration.as_millis() as u64,
            "transfer complete"
        );
        duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
