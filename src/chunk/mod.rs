pub mod codec;
pub mod error;
pub mod types;

pub use codec::{checksum, diagnose, join, split};
pub use error::{ChunkError, Result};
pub use types::{Chunk, Diagnosis};
