//! Named link conditions for tests

#![allow(dead_code)]

use bit_messenger::coordinator::EndpointConfig;
use bit_messenger::network::SimulatorConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub name: &'static str,
    pub delay_ms: u64,
    pub loss: f64,
}

impl NetworkProfile {
    pub fn all_profiles() -> Vec<NetworkProfile> {
        vec![
            Self::perfect(),
            Self::lan(),
            Self::congested(),
            Self::disaster(),
            Self::severe_disaster(),
        ]
    }

    pub fn perfect() -> Self {
        Self {
            name: "perfect",
            delay_ms: 0,
            loss: 0.0,
        }
    }

    pub fn lan() -> Self {
        Self {
            name: "lan",
            delay_ms: 2,
            loss: 0.01,
        }
    }

    pub fn congested() -> Self {
        Self {
            name: "congested",
            delay_ms: 150,
            loss: 0.1,
        }
    }

    pub fn disaster() -> Self {
        Self {
            name: "disaster",
            delay_ms: 300,
            loss: 0.3,
        }
    }

    pub fn severe_disaster() -> Self {
        Self {
            name: "severe-disaster",
            delay_ms: 500,
            loss: 0.5,
        }
    }

    pub fn simulator(&self) -> SimulatorConfig {
        SimulatorConfig {
            delay_ms_base: self.delay_ms,
            loss_probability: self.loss,
        }
    }

    pub fn endpoint(&self, chunk_size: usize) -> EndpointConfig {
        EndpointConfig {
            chunk_size,
            simulator: self.simulator(),
            pacing: Duration::from_millis(120),
        }
    }
}
