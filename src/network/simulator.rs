//! Simulated unreliable delivery
//!
//! Every chunk gets its own delay and loss draw. Delivered chunks are handed to
//! the channel unmodified and in no particular order.

use parking_lot::RwLock;
use rand::Rng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::error::NetworkResult;
use super::types::{Delivery, SimulatorConfig, SimulatorStats};
use crate::chunk::Chunk;
use crate::metrics;
use crate::protocol::{DataMessage, PacketFrame};

/// Fire-and-forget send primitive of the peer transport.
///
/// No ordering or delivery guarantee; the return value only says whether the
/// message was handed to the transport.
pub trait DataChannel: Send + Sync + 'static {
    fn send(&self, message: DataMessage) -> bool;
}

impl DataChannel for mpsc::UnboundedSender<DataMessage> {
    fn send(&self, message: DataMessage) -> bool {
        mpsc::UnboundedSender::send(self, message).is_ok()
    }
}

/// Applies delay and loss to chunks on their way to a [`DataChannel`]
#[derive(Clone)]
pub struct DeliverySimulator {
    config: Arc<RwLock<SimulatorConfig>>,
    stats: Arc<SimulatorStats>,
}

impl DeliverySimulator {
    pub fn new(config: SimulatorConfig) -> NetworkResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            stats: Arc::new(SimulatorStats::default()),
        })
    }

    pub fn config(&self) -> SimulatorConfig {
        *self.config.read()
    }

    /// Change conditions for chunks submitted from now on
    pub fn update(&self, config: SimulatorConfig) -> NetworkResult<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    pub fn stats(&self) -> Arc<SimulatorStats> {
        self.stats.clone()
    }

    /// `base` plus uniform jitter in `[0, base / 2)`
    pub fn draw_delay<R: Rng>(delay_ms_base: u64, rng: &mut R) -> Duration {
        let jitter_cap = delay_ms_base / 2;
        let jitter = if jitter_cap > 0 {
            rng.gen_range(0..jitter_cap)
        } else {
            0
        };
        Duration::from_millis(delay_ms_base + jitter)
    }

    /// Submit a chunk. Must be called from within a tokio runtime.
    ///
    /// A lost chunk is never handed to the channel. Otherwise a detached task
    /// delivers it after the drawn delay; that task is not cancelled if the
    /// transfer is superseded in the meantime.
    pub fn send(&self, chunk: &Chunk, generation: u64, channel: Arc<dyn DataChannel>) -> Delivery {
        let config = self.config();
        let (delay, lost) = {
            let mut rng = rand::thread_rng();
            let delay = Self::draw_delay(config.delay_ms_base, &mut rng);
            (delay, rng.gen::<f64>() < config.loss_probability)
        };

        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        metrics::record_chunk_submitted(&chunk.correlation_id);

        if lost {
            self.stats.lost.fetch_add(1, Ordering::Relaxed);
            metrics::record_chunk_lost(&chunk.correlation_id);
            tracing::trace!(
                correlation_id = %chunk.correlation_id,
                sequence = chunk.sequence,
                "chunk lost in simulation"
            );
            return Delivery::Lost;
        }

        let message = DataMessage::Packet(PacketFrame::from_chunk(chunk, generation));
        let stats = self.stats.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if channel.send(message) {
                stats.delivered.fetch_add(1, Ordering::Relaxed);
            }
        });

        Delivery::Scheduled { delay }
    }
}
