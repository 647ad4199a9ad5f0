//! Payload chunking and reassembly
//!
//! The checksum is a plain additive byte sum modulo 256. It is commutative and
//! collision-prone: any permutation of the same bytes yields the same value, so
//! a matching checksum is never proof of integrity.

use bytes::Bytes;
use std::collections::BTreeMap;

use super::error::{ChunkError, Result};
use super::types::{Chunk, Diagnosis};

/// Additive checksum of `bytes`, modulo 256
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Split `payload` into chunks of at most `chunk_size` bytes.
///
/// An empty payload still produces a single, empty chunk so that the receiver
/// has something to complete on.
pub fn split(payload: &[u8], chunk_size: usize, correlation_id: &str) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(ChunkError::InvalidChunkSize(chunk_size));
    }

    let total = payload.len().div_ceil(chunk_size).max(1);
    let total = u32::try_from(total).map_err(|_| ChunkError::InvalidChunkSize(chunk_size))?;

    let mut chunks = Vec::with_capacity(total as usize);
    for index in 0..total as usize {
        let start = (index * chunk_size).min(payload.len());
        let end = (start + chunk_size).min(payload.len());
        let slice = &payload[start..end];

        chunks.push(Chunk {
            correlation_id: correlation_id.to_string(),
            sequence: index as u32 + 1,
            total,
            payload_length: slice.len(),
            checksum: checksum(slice),
            payload: Bytes::copy_from_slice(slice),
        });
    }

    Ok(chunks)
}

/// Concatenate chunk payloads in sequence order.
///
/// Performs no deduplication or gap filling; callers pass exactly one chunk per
/// sequence number.
pub fn join<'a, I>(chunks: I) -> Bytes
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut sorted: Vec<&Chunk> = chunks.into_iter().collect();
    sorted.sort_by_key(|c| c.sequence);

    let size = sorted.iter().map(|c| c.payload.len()).sum();
    let mut out = Vec::with_capacity(size);
    for chunk in sorted {
        out.extend_from_slice(&chunk.payload);
    }
    Bytes::from(out)
}

/// Work out which sequences are missing or corrupt.
///
/// `total` is the largest `total` or `sequence` seen, which keeps the result
/// sensible for partial or inconsistent input.
pub fn diagnose<'a, I>(chunks: I) -> Diagnosis
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut total = 0u32;
    let mut by_sequence: BTreeMap<u32, Chunk> = BTreeMap::new();

    for chunk in chunks {
        total = total.max(chunk.total).max(chunk.sequence);
        by_sequence
            .entry(chunk.sequence)
            .or_insert_with(|| chunk.clone());
    }

    let missing = (1..=total)
        .filter(|seq| !by_sequence.contains_key(seq))
        .collect();

    let bad = by_sequence
        .values()
        .filter(|c| !c.is_intact())
        .map(|c| c.sequence)
        .collect();

    Diagnosis {
        total,
        missing,
        bad,
        by_sequence,
    }
}
