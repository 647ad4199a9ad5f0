use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    #[error("Invalid sequence {sequence} for total {total}")]
    InvalidSequence { sequence: u32, total: u32 },

    #[error("Payload encoding error: {0}")]
    PayloadEncoding(String),
}

impl From<hex::FromHexError> for ChunkError {
    fn from(err: hex::FromHexError) -> Self {
        ChunkError::PayloadEncoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChunkError>;
