use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    #[error("Invalid loss probability: {0} (expected 0.0..=1.0)")]
    InvalidLossProbability(f64),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
