//! Data channel wrapper that damages packets on their way to the peer

#![allow(dead_code)]

use bit_messenger::network::DataChannel;
use bit_messenger::protocol::DataMessage;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct TamperConfig {
    /// Chance (0.0 - 1.0) that a packet's payload has one byte flipped
    pub corruption_rate: f64,
    /// Chance (0.0 - 1.0) that a packet is handed over twice
    pub duplicate_rate: f64,
}

impl TamperConfig {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn corrupting(rate: f64) -> Self {
        Self {
            corruption_rate: rate,
            ..Self::default()
        }
    }

    pub fn duplicating(rate: f64) -> Self {
        Self {
            duplicate_rate: rate,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct TamperStats {
    pub forwarded: AtomicU64,
    pub corrupted: AtomicU64,
    pub duplicated: AtomicU64,
}

impl TamperStats {
    pub fn corrupted(&self) -> u64 {
        self.corrupted.load(Ordering::Relaxed)
    }

    pub fn duplicated(&self) -> u64 {
        self.duplicated.load(Ordering::Relaxed)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

pub struct TamperingChannel {
    inner: Arc<dyn DataChannel>,
    config: TamperConfig,
    stats: Arc<TamperStats>,
}

impl TamperingChannel {
    pub fn new(inner: Arc<dyn DataChannel>, config: TamperConfig) -> Self {
        Self {
            inner,
            config,
            stats: Arc::new(TamperStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<TamperStats> {
        self.stats.clone()
    }

    /// Flip every bit of one payload byte; the declared checksum is left alone
    fn corrupt(message: DataMessage) -> DataMessage {
        match message {
            DataMessage::Packet(mut frame) => {
                if let Ok(mut bytes) = hex::decode(&frame.payload) {
                    if let Some(first) = bytes.first_mut() {
                        *first = !*first;
                    }
                    frame.payload = hex::encode(bytes);
                }
                DataMessage::Packet(frame)
            }
            other => other,
        }
    }
}

impl DataChannel for TamperingChannel {
    fn send(&self, message: DataMessage) -> bool {
        let is_packet = matches!(message, DataMessage::Packet(ref frame) if frame.payload_length > 0);
        let (corrupt, duplicate) = {
            let mut rng = rand::thread_rng();
            (
                is_packet && rng.gen::<f64>() < self.config.corruption_rate,
                is_packet && rng.gen::<f64>() < self.config.duplicate_rate,
            )
        };

        let message = if corrupt {
            self.stats.corrupted.fetch_add(1, Ordering::Relaxed);
            Self::corrupt(message)
        } else {
            message
        };

        if duplicate {
            self.stats.duplicated.fetch_add(1, Ordering::Relaxed);
            self.inner.send(message.clone());
        }

        self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
        self.inner.send(message)
    }
}
