use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Endpoint is no longer running")]
    EndpointClosed,

    #[error("Invalid endpoint configuration: {0}")]
    InvalidConfig(String),

    #[error("Chunk error: {0}")]
    ChunkError(#[from] crate::chunk::ChunkError),

    #[error("Network error: {0}")]
    NetworkError(#[from] crate::network::NetworkError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
