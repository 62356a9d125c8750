// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Link-time configuration.

use core::fmt;

use crate::chunked::ChunkedSequence;
use crate::pipeline::{Contribution, SectionMap};
use crate::section::SectionKind;
use crate::sparse::Domain;

/// Chunk sizes used by a [`crate::Linker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Chunk capacity of the byte arena that holds section maps.
    pub storage_chunk_bytes: usize,
    /// Chunk capacity, in contributions, of each output section.
    pub contribution_chunk_len: usize,
}

impl Limits {
    /// Smallest storage chunk that can hold any section map at any alignment.
    pub const MIN_STORAGE_CHUNK_BYTES: usize =
        SectionMap::size_bytes(SectionKind::COUNT) + SectionMap::ALIGN - 1;

    /// Checks that every reservation a link can make fits in one storage chunk.
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.contribution_chunk_len == 0 {
            return Err(LimitsError::ZeroContributionChunk);
        }
        if self.storage_chunk_bytes < Self::MIN_STORAGE_CHUNK_BYTES {
            return Err(LimitsError::StorageChunkTooSmall {
                needed: Self::MIN_STORAGE_CHUNK_BYTES,
                actual: self.storage_chunk_bytes,
            });
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            storage_chunk_bytes: 4096,
            contribution_chunk_len: ChunkedSequence::<Contribution>::default_chunk_capacity(),
        }
    }
}

/// A rejected [`Limits`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitsError {
    /// Output sections cannot use zero-length chunks.
    ZeroContributionChunk,
    /// The storage chunk cannot hold the largest section map.
    StorageChunkTooSmall {
        /// Minimum chunk size.
        needed: usize,
        /// Configured chunk size.
        actual: usize,
    },
}

impl fmt::Display for LimitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroContributionChunk => write!(f, "contribution chunk length must be non-zero"),
            Self::StorageChunkTooSmall { needed, actual } => write!(
                f,
                "storage chunk too small for a full section map: needed={needed} actual={actual}"
            ),
        }
    }
}

impl core::error::Error for LimitsError {}
