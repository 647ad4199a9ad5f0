//! Command-line and environment configuration

use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::coordinator::EndpointConfig;
use crate::eventlog::DEFAULT_CAPACITY;
use crate::network::SimulatorConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid bind address {host}:{port}")]
    InvalidAddress { host: String, port: u16 },

    #[error("Chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("Loss must be a probability between 0 and 1, got {0}")]
    InvalidLoss(f64),

    #[error("Log capacity must be at least 1")]
    ZeroLogCapacity,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Relay server settings
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Entries kept by the administrative event log
    #[arg(long, env = "LOG_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub log_capacity: usize,

    /// Do not install the Prometheus recorder
    #[arg(long)]
    pub no_metrics: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::InvalidAddress {
            host: self.host.clone(),
            port: self.port,
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.bind_addr()?;
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_capacity: DEFAULT_CAPACITY,
            no_metrics: false,
        }
    }
}

/// Chunking and simulated link settings of a transfer endpoint
#[derive(Debug, Clone, Copy, Args)]
pub struct TransferConfig {
    /// Maximum payload bytes per chunk
    #[arg(long, default_value_t = 12)]
    pub chunk_size: usize,

    /// Base delivery delay in milliseconds; up to half of it is added as jitter
    #[arg(long, default_value_t = 300)]
    pub delay_ms: u64,

    /// Probability that a chunk is lost (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub loss: f64,

    /// Gap between chunks of a first transmission, in milliseconds
    #[arg(long, default_value_t = 120)]
    pub pacing_ms: u64,
}

impl TransferConfig {
    pub fn simulator(&self) -> ConfigResult<SimulatorConfig> {
        SimulatorConfig::new(self.delay_ms, self.loss).map_err(|_| ConfigError::InvalidLoss(self.loss))
    }

    pub fn endpoint(&self) -> ConfigResult<EndpointConfig> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(EndpointConfig {
            chunk_size: self.chunk_size,
            simulator: self.simulator()?,
            pacing: Duration::from_millis(self.pacing_ms),
        })
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 12,
            delay_ms: 300,
            loss: 0.0,
            pacing_ms: 120,
        }
    }
}
