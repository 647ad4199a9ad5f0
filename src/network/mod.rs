pub mod error;
pub mod framed;
pub mod simulator;
pub mod types;

pub use error::{NetworkError, NetworkResult};
pub use framed::{spawn_decoder, TextChannel};
pub use simulator::{DataChannel, DeliverySimulator};
pub use types::{Delivery, SimulatorConfig, SimulatorStats};
