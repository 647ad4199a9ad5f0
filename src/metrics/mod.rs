//! Metrics and observability module
//!
//! Prometheus-compatible metrics for transfers and the relay service:
//! - Chunk traffic (submitted, lost, received, bad, duplicate, retransmitted)
//! - NACK requests and malformed data frames
//! - Transfer starts, completions and durations
//! - Relayed messages, room-full rejections and active rooms

pub mod exporter;
pub mod recorder;

pub use exporter::{install_metrics, metrics_route, render_metrics, MetricsError};
pub use recorder::{
    init_metrics, record_chunk_lost, record_chunk_received, record_chunk_submitted,
    record_frame_dropped, record_message_relayed, record_nack_sent, record_retransmission,
    record_room_full, set_active_rooms, TransferMetrics,
};
