// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aligned contiguous reservations carved out of a byte [`ChunkedSequence`].
//!
//! This is a bump allocator: storage is never released individually, and the only way to reclaim
//! it is to drop the whole sequence. A reservation never straddles a chunk boundary. When the
//! room left in the current chunk cannot hold the request plus worst-case alignment slack, the
//! rest of that chunk is skipped so the reservation starts in a fresh one.
//!
//! ```text
//!   chunk 0                               chunk 1
//!   ┌────────┬─────┬──────────┬─────────┐ ┌─────┬───────────────┬───────
//!   │ earlier│ pad │ region A │ wasted  │ │ pad │   region B    │ ...
//!   └────────┴─────┴──────────┴─────────┘ └─────┴───────────────┴───────
//! ```

use core::fmt;

use crate::chunked::{ChunkError, ChunkedSequence, Region};

/// A reservation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReserveError {
    /// Alignment was zero or not a power of two.
    BadAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// The request plus its alignment slack can never fit a single chunk.
    CapacityExceeded {
        /// Requested number of bytes.
        required: usize,
        /// Requested alignment.
        align: usize,
        /// Capacity of one chunk of the storage.
        chunk_capacity: usize,
    },
    /// Growing the storage failed.
    Chunk(ChunkError),
}

impl fmt::Display for ReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAlignment { align } => {
                write!(f, "alignment must be a power of two: align={align}")
            }
            Self::CapacityExceeded {
                required,
                align,
                chunk_capacity,
            } => write!(
                f,
                "reservation cannot fit one chunk: required={required} align={align} chunk_capacity={chunk_capacity}"
            ),
            Self::Chunk(err) => write!(f, "storage growth failed: {err}"),
        }
    }
}

impl core::error::Error for ReserveError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Chunk(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChunkError> for ReserveError {
    fn from(err: ChunkError) -> Self {
        Self::Chunk(err)
    }
}

/// A successful reservation together with the bytes it cost beyond the request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// The aligned storage handed to the caller.
    pub region: Region,
    /// Dead bytes skipped in front of `region` to reach the alignment.
    pub padding: usize,
    /// Bytes at the end of the previous chunk abandoned to keep `region` in one chunk.
    pub wasted: usize,
}

/// Reserves `required` contiguous bytes aligned to `align`.
///
/// Returns `Ok(None)` without touching `storage` when `required` is zero.
pub fn reserve(
    storage: &mut ChunkedSequence<u8>,
    required: usize,
    align: usize,
) -> Result<Option<Region>, ReserveError> {
    Ok(reserve_detailed(storage, required, align)?.map(|r| r.region))
}

/// Like [`reserve`], but also reports the padding and the wasted chunk tail.
pub fn reserve_detailed(
    storage: &mut ChunkedSequence<u8>,
    required: usize,
    align: usize,
) -> Result<Option<Reservation>, ReserveError> {
    if !align.is_power_of_two() {
        return Err(ReserveError::BadAlignment { align });
    }
    if required == 0 {
        return Ok(None);
    }
    let chunk_capacity = storage.chunk_capacity();
    let worst_case = required
        .checked_add(align - 1)
        .filter(|&n| n <= chunk_capacity)
        .ok_or(ReserveError::CapacityExceeded {
            required,
            align,
            chunk_capacity,
        })?;

    let capacity = storage.capacity();
    let room = capacity - storage.len();
    let mut wasted = 0;
    if room < worst_case {
        // Burn through the rest of the final chunk.
        storage.resize(capacity)?;
        wasted = room;
    }

    let (first, address) = storage.push_addressed(0)?;
    let padding = address.wrapping_neg() & (align - 1);
    let start = first + padding;
    storage.resize(start + required)?;

    Ok(Some(Reservation {
        region: Region::new(start, required),
        padding,
        wasted,
    }))
}
