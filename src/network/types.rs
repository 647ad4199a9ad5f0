use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::error::{NetworkError, NetworkResult};

/// Conditions applied to every chunk handed to the simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Base delay in milliseconds; up to 50% jitter is added on top
    pub delay_ms_base: u64,
    /// Probability (0.0 - 1.0) that a chunk is never delivered
    pub loss_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delay_ms_base: 300,
            loss_probability: 0.0,
        }
    }
}

impl SimulatorConfig {
    /// A channel that delivers everything immediately
    pub fn perfect() -> Self {
        Self {
            delay_ms_base: 0,
            loss_probability: 0.0,
        }
    }

    pub fn new(delay_ms_base: u64, loss_probability: f64) -> NetworkResult<Self> {
        let config = Self {
            delay_ms_base,
            loss_probability,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NetworkResult<()> {
        if !self.loss_probability.is_finite() || !(0.0..=1.0).contains(&self.loss_probability) {
            return Err(NetworkError::InvalidLossProbability(self.loss_probability));
        }
        Ok(())
    }
}

/// What happened to a chunk handed to the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Will be handed to the channel once `delay` has elapsed
    Scheduled { delay: Duration },
    /// Dropped; the receiver sees it as missing
    Lost,
}

impl Delivery {
    pub fn is_lost(&self) -> bool {
        matches!(self, Delivery::Lost)
    }
}

/// Counters collected by the simulator
#[derive(Debug, Default)]
pub struct SimulatorStats {
    pub submitted: AtomicU64,
    pub lost: AtomicU64,
    pub delivered: AtomicU64,
}

impl SimulatorStats {
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn actual_loss_rate(&self) -> f64 {
        let submitted = self.submitted();
        if submitted > 0 {
            self.lost() as f64 / submitted as f64
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for SimulatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Submitted: {}, Lost: {} ({:.1}%), Delivered: {}",
            self.submitted(),
            self.lost(),
            self.actual_loss_rate() * 100.0,
            self.delivered()
        )
    }
}
