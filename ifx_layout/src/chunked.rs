// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segmented, address-stable arena storage.
//!
//! A [`ChunkedSequence`] is a list of fixed-capacity chunks. Each chunk's buffer is allocated once
//! at its full capacity and is never reallocated, so an element keeps its address for as long as
//! the sequence is alive, no matter how many chunks are added later.
//!
//! Elements are named by a flat index: element `i` lives in chunk `i / chunk_capacity` at offset
//! `i % chunk_capacity`. A run of consecutive elements that lies inside a single chunk is named by
//! a [`Region`] and can be borrowed as a plain slice.

use alloc::vec::Vec;
use core::fmt;
use core::mem::size_of;
use core::ptr;

/// Target byte size of a chunk when no explicit capacity is given.
const DEFAULT_CHUNK_BYTES: usize = 4096;

/// A chunked-sequence error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkError {
    /// A chunk capacity of zero was requested.
    ZeroCapacity,
    /// The allocator could not provide a new chunk.
    OutOfMemory {
        /// Number of elements the failed chunk would have held.
        chunk_capacity: usize,
    },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "chunk capacity must be non-zero"),
            Self::OutOfMemory { chunk_capacity } => {
                write!(f, "out of memory allocating a chunk of {chunk_capacity} elements")
            }
        }
    }
}

impl core::error::Error for ChunkError {}

/// A run of consecutive elements inside one chunk of a [`ChunkedSequence`].
///
/// A region is a handle, not an owner: it names storage that belongs to the sequence it was
/// produced by and is meaningful only for that sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    start: usize,
    len: usize,
}

impl Region {
    /// Creates a region of `len` elements starting at flat index `start`.
    #[inline]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Flat index of the first element.
    #[inline]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Number of elements in the region.
    #[inline]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns `true` if the region names no elements.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Flat index one past the last element.
    #[inline]
    pub const fn end(self) -> usize {
        self.start + self.len
    }
}

/// A growable sequence of fixed-capacity chunks whose elements never move.
///
/// This deliberately does not implement `Clone`: a cloned `Vec` only guarantees `len` elements
/// of capacity, which would break the "a chunk never reallocates" invariant.
#[derive(Debug)]
pub struct ChunkedSequence<T> {
    chunks: Vec<Vec<T>>,
    chunk_capacity: usize,
    len: usize,
}

impl<T> Default for ChunkedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChunkedSequence<T> {
    /// Creates an empty sequence using [`Self::default_chunk_capacity`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunks: Vec::new(),
            chunk_capacity: Self::default_chunk_capacity(),
            len: 0,
        }
    }

    /// Creates an empty sequence whose chunks each hold `chunk_capacity` elements.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Result<Self, ChunkError> {
        if chunk_capacity == 0 {
            return Err(ChunkError::ZeroCapacity);
        }
        Ok(Self {
            chunks: Vec::new(),
            chunk_capacity,
            len: 0,
        })
    }

    /// Number of elements that fit a 4 KiB chunk (at least one).
    #[must_use]
    pub const fn default_chunk_capacity() -> usize {
        let size = size_of::<T>();
        if size == 0 || size > DEFAULT_CHUNK_BYTES {
            1
        } else {
            DEFAULT_CHUNK_BYTES / size
        }
    }

    /// Number of elements each chunk holds.
    #[inline]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Number of allocated chunks.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of elements in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the sequence holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of element slots across all allocated chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_capacity
    }

    /// Appends `value` and returns its flat index.
    ///
    /// A new chunk is allocated when the last one is full. Nothing is appended if that
    /// allocation fails.
    pub fn push(&mut self, value: T) -> Result<usize, ChunkError> {
        self.push_addressed(value).map(|(index, _)| index)
    }

    /// Appends `value` and returns its flat index together with its address.
    pub(crate) fn push_addressed(&mut self, value: T) -> Result<(usize, usize), ChunkError> {
        if self.len == self.capacity() {
            self.grow()?;
        }
        let index = self.len;
        let offset = index % self.chunk_capacity;
        let chunk = &mut self.chunks[index / self.chunk_capacity];
        chunk.push(value);
        let address = ptr::from_ref(&chunk[offset]).addr();
        self.len += 1;
        Ok((index, address))
    }

    /// Grows the sequence to `new_len` elements, filling new slots with `T::default()`.
    ///
    /// Chunks are allocated as needed. Shrinking is not supported; a `new_len` that is not larger
    /// than [`Self::len`] leaves the sequence unchanged.
    pub fn resize(&mut self, new_len: usize) -> Result<(), ChunkError>
    where
        T: Default,
    {
        while self.len < new_len {
            if self.len == self.capacity() {
                self.grow()?;
            }
            let chunk_capacity = self.chunk_capacity;
            let chunk = &mut self.chunks[self.len / chunk_capacity];
            let fill = (new_len - self.len).min(chunk_capacity - chunk.len());
            chunk.resize_with(chunk.len() + fill, T::default);
            self.len += fill;
        }
        Ok(())
    }

    /// Returns the element at flat index `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.chunks
            .get(index / self.chunk_capacity)?
            .get(index % self.chunk_capacity)
    }

    /// Returns the element at flat index `index` mutably.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.chunks
            .get_mut(index / self.chunk_capacity)?
            .get_mut(index % self.chunk_capacity)
    }

    /// Returns the most recently appended element.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.chunks.last()?.last()
    }

    /// Iterates all elements in append order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.chunks.iter().flatten()
    }

    /// Iterates the initialized part of each chunk.
    pub fn chunks(&self) -> impl ExactSizeIterator<Item = &[T]> {
        self.chunks.iter().map(Vec::as_slice)
    }

    /// Borrows the elements named by `region`.
    ///
    /// Returns `None` if the region is out of range or crosses a chunk boundary.
    pub fn contiguous(&self, region: Region) -> Option<&[T]> {
        let (chunk, range) = self.locate(region)?;
        self.chunks.get(chunk)?.get(range)
    }

    /// Mutably borrows the elements named by `region`.
    ///
    /// Returns `None` if the region is out of range or crosses a chunk boundary.
    pub fn contiguous_mut(&mut self, region: Region) -> Option<&mut [T]> {
        let (chunk, range) = self.locate(region)?;
        self.chunks.get_mut(chunk)?.get_mut(range)
    }

    /// Returns the memory address of the element at `index`.
    ///
    /// The address stays the same for the lifetime of the sequence.
    pub fn address_of(&self, index: usize) -> Option<usize> {
        self.get(index).map(|element| ptr::from_ref(element).addr())
    }

    fn locate(&self, region: Region) -> Option<(usize, core::ops::Range<usize>)> {
        let chunk = region.start / self.chunk_capacity;
        let offset = region.start % self.chunk_capacity;
        let end = offset.checked_add(region.len)?;
        if end > self.chunk_capacity {
            return None;
        }
        Some((chunk, offset..end))
    }

    fn grow(&mut self) -> Result<(), ChunkError> {
        let oom = ChunkError::OutOfMemory {
            chunk_capacity: self.chunk_capacity,
        };
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(self.chunk_capacity)
            .map_err(|_| oom)?;
        self.chunks.try_reserve(1).map_err(|_| oom)?;
        self.chunks.push(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            ChunkedSequence::<u8>::with_chunk_capacity(0).unwrap_err(),
            ChunkError::ZeroCapacity
        );
    }

    #[test]
    fn default_capacity_targets_4k() {
        assert_eq!(ChunkedSequence::<u8>::default_chunk_capacity(), 4096);
        assert_eq!(ChunkedSequence::<u64>::default_chunk_capacity(), 512);
        assert_eq!(ChunkedSequence::<[u8; 8192]>::default_chunk_capacity(), 1);
        assert_eq!(ChunkedSequence::<()>::default_chunk_capacity(), 1);
    }

    #[test]
    fn push_starts_new_chunk_when_full() {
        let mut s = ChunkedSequence::with_chunk_capacity(3).unwrap();
        assert_eq!(s.capacity(), 0);
        for v in 0..4_u32 {
            assert_eq!(s.push(v), Ok(v as usize));
        }
        assert_eq!(s.len(), 4);
        assert_eq!(s.chunk_count(), 2);
        assert_eq!(s.capacity(), 6);
        assert_eq!(s.get(3), Some(&3));
        assert_eq!(s.last(), Some(&3));
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn resize_fills_across_chunks() {
        let mut s = ChunkedSequence::<u8>::with_chunk_capacity(4).unwrap();
        s.push(7).unwrap();
        s.resize(10).unwrap();
        assert_eq!(s.len(), 10);
        assert_eq!(s.chunk_count(), 3);
        assert_eq!(s.get(0), Some(&7));
        assert!(s.iter().skip(1).all(|&b| b == 0));

        let sizes: Vec<_> = s.chunks().map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        // Shrinking is a no-op.
        s.resize(2).unwrap();
        assert_eq!(s.len(), 10);
    }

    #[test]
    fn resize_to_capacity_exhausts_last_chunk() {
        let mut s = ChunkedSequence::<u8>::with_chunk_capacity(8).unwrap();
        s.push(1).unwrap();
        s.resize(s.capacity()).unwrap();
        assert_eq!(s.len(), 8);
        assert_eq!(s.chunk_count(), 1);
        assert_eq!(s.push(2), Ok(8));
        assert_eq!(s.chunk_count(), 2);
    }

    #[test]
    fn contiguous_rejects_straddling_regions() {
        let mut s = ChunkedSequence::<u8>::with_chunk_capacity(4).unwrap();
        s.resize(8).unwrap();
        assert_eq!(s.contiguous(Region::new(1, 3)).map(<[u8]>::len), Some(3));
        assert!(s.contiguous(Region::new(3, 2)).is_none());
        assert!(s.contiguous(Region::new(8, 1)).is_none());
        assert_eq!(s.contiguous(Region::new(4, 0)), Some(&[][..]));

        s.contiguous_mut(Region::new(4, 4))
            .unwrap()
            .copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(s.get(6), Some(&3));
    }

    #[test]
    fn addresses_survive_growth() {
        let mut s = ChunkedSequence::<u64>::with_chunk_capacity(2).unwrap();
        let (index, address) = s.push_addressed(42).unwrap();
        assert_eq!(s.address_of(index), Some(address));
        for v in 0..100 {
            s.push(v).unwrap();
        }
        assert_eq!(s.address_of(index), Some(address));
        assert_eq!(s.get(index), Some(&42));
        assert_eq!(s.chunk_count(), 51);
    }

    #[test]
    fn failed_chunk_allocation_commits_nothing() {
        let chunk_capacity = usize::MAX / 4;
        let mut s = ChunkedSequence::<u64>::with_chunk_capacity(chunk_capacity).unwrap();
        let oom = ChunkError::OutOfMemory { chunk_capacity };

        assert_eq!(s.push(1), Err(oom));
        assert_eq!(s.len(), 0);
        assert_eq!(s.chunk_count(), 0);
        assert_eq!(s.capacity(), 0);

        assert_eq!(s.resize(3), Err(oom));
        assert_eq!(s.len(), 0);
        assert_eq!(s.chunk_count(), 0);
        assert!(s.get(0).is_none());
    }
}
