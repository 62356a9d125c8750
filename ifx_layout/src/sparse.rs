// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitmap-indexed sparse maps built inside caller-provided storage.
//!
//! A sparse map over a [`Domain`] of `K` indices stores a presence bitmap followed by exactly one
//! value slot per present index, in ascending index order:
//!
//! ```text
//!   ┌──────────────┬─────────┬─────────┬─────┬─────────┐
//!   │ bitmap (LE)  │ slot i0 │ slot i1 │ ... │ slot iN │    i0 < i1 < ... < iN
//!   └──────────────┴─────────┴─────────┴─────┴─────────┘
//!    Bitmap::BYTES  Slot::SIZE each
//! ```
//!
//! The slot for index `i` is at position `popcount(bitmap & ((1 << i) - 1))`.
//!
//! The maps never own memory. [`SparseArrayMut::build`] lays a map out in a byte slice sized with
//! [`SparseArray::size_bytes`] (normally a region reserved from the arena), and the view types
//! borrow that slice for as long as they are used. The set of present indices is fixed at build
//! time; afterwards only slot values change.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::bitmap::{Bitmap, BitmapFor, SelectBitmap, Width, mask_below};

/// A sparse-map error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SparseError {
    /// An index was outside the domain.
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// Size of the domain.
        count: usize,
    },
    /// An index was supplied twice while building a map.
    DuplicateIndex {
        /// The repeated index.
        index: usize,
    },
    /// The index has no slot in this map.
    MissingIndex {
        /// The absent index.
        index: usize,
    },
    /// The storage does not have the exact size the map requires.
    SizeMismatch {
        /// Bytes the map requires.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, count } => {
                write!(f, "index out of range: index={index} count={count}")
            }
            Self::DuplicateIndex { index } => write!(f, "duplicate index: {index}"),
            Self::MissingIndex { index } => write!(f, "index not present: {index}"),
            Self::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "sparse map storage size mismatch: expected={expected} actual={actual}"
                )
            }
        }
    }
}

impl core::error::Error for SparseError {}

/// A small, closed index domain `0..COUNT`.
pub trait Domain: Copy {
    /// Number of distinct indices.
    const COUNT: usize;
    /// Bitmap type with one bit per index.
    type Bitmap: Bitmap;

    /// Returns the integer index of `self`.
    fn to_index(self) -> usize;

    /// Returns the domain value for `index`, if it is in range.
    fn from_index(index: usize) -> Option<Self>;
}

/// A plain integer index known to be below `K`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bounded<const K: usize>(usize);

impl<const K: usize> Bounded<K> {
    /// Returns `Some` if `index < K`.
    #[inline]
    pub const fn new(index: usize) -> Option<Self> {
        if index < K { Some(Self(index)) } else { None }
    }

    /// Returns the raw index.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl<const K: usize> Domain for Bounded<K>
where
    Width<K>: SelectBitmap,
{
    const COUNT: usize = K;
    type Bitmap = BitmapFor<K>;

    #[inline]
    fn to_index(self) -> usize {
        self.0
    }

    #[inline]
    fn from_index(index: usize) -> Option<Self> {
        Self::new(index)
    }
}

/// A fixed-size value stored in a sparse-map slot.
///
/// Slots are encoded little-endian into exactly [`Slot::SIZE`] bytes. `SIZE` must be non-zero;
/// sizing a map with a zero-size slot is rejected at compile time:
///
/// ```compile_fail
/// use ifx_layout::{Bounded, Slot, SparseArray};
///
/// #[derive(Copy, Clone, Default)]
/// struct Nothing;
///
/// impl Slot for Nothing {
///     const SIZE: usize = 0;
///     const ALIGN: usize = 1;
///     fn encode(self, _out: &mut [u8]) {}
///     fn decode(_bytes: &[u8]) -> Self {
///         Self
///     }
/// }
///
/// let _ = SparseArray::<Bounded<4>, Nothing>::size_bytes(1);
/// ```
pub trait Slot: Copy + Default {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Natural alignment of the encoded form.
    const ALIGN: usize;

    /// Encodes `self` into the first [`Self::SIZE`] bytes of `out`.
    fn encode(self, out: &mut [u8]);

    /// Decodes a value from the first [`Self::SIZE`] bytes of `bytes`.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_slot {
    ($($ty:ty),*) => {
        $(
            impl Slot for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();
                const ALIGN: usize = core::mem::align_of::<$ty>();

                #[inline]
                fn encode(self, out: &mut [u8]) {
                    if let Some(dst) = out.first_chunk_mut::<{ core::mem::size_of::<$ty>() }>() {
                        *dst = self.to_le_bytes();
                    }
                }

                #[inline]
                fn decode(bytes: &[u8]) -> Self {
                    bytes
                        .first_chunk::<{ core::mem::size_of::<$ty>() }>()
                        .map_or(0, |b| <$ty>::from_le_bytes(*b))
                }
            }
        )*
    };
}

impl_slot!(u32, u64);

/// Read-only view of a sparse map.
pub struct SparseArray<'a, D, V> {
    bitmap: u64,
    slots: &'a [u8],
    _marker: PhantomData<fn() -> (D, V)>,
}

/// Mutable view of a sparse map; slot values may change, the index set may not.
pub struct SparseArrayMut<'a, D, V> {
    bitmap: u64,
    slots: &'a mut [u8],
    _marker: PhantomData<fn() -> (D, V)>,
}

impl<D, V> Clone for SparseArray<'_, D, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, V> Copy for SparseArray<'_, D, V> {}

impl<D: Domain + fmt::Debug, V: Slot + fmt::Debug> fmt::Debug for SparseArray<'_, D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<D: Domain + fmt::Debug, V: Slot + fmt::Debug> fmt::Debug for SparseArrayMut<'_, D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<'a, D: Domain, V: Slot> SparseArray<'a, D, V> {
    /// Alignment to request for the storage of a map.
    pub const ALIGN: usize = if D::Bitmap::ALIGN > V::ALIGN {
        D::Bitmap::ALIGN
    } else {
        V::ALIGN
    };

    /// Exact number of bytes a map with `count` present indices occupies.
    #[must_use]
    #[inline]
    pub const fn size_bytes(count: usize) -> usize {
        D::Bitmap::BYTES + count * slot_size::<V>()
    }

    /// Opens a map previously built in `bytes`.
    pub fn view(bytes: &'a [u8]) -> Result<Self, SparseError> {
        let bitmap = decode_bitmap::<D, V>(bytes)?;
        Ok(Self {
            bitmap,
            slots: bytes.get(D::Bitmap::BYTES..).unwrap_or_default(),
            _marker: PhantomData,
        })
    }

    /// Returns the presence bitmap.
    #[inline]
    pub fn bitmap(&self) -> D::Bitmap {
        D::Bitmap::from_bits(self.bitmap)
    }

    /// Number of present indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.bitmap.count_ones() as usize
    }

    /// Returns `true` if no index is present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap == 0
    }

    /// Bytes occupied by this map.
    #[inline]
    pub fn footprint(&self) -> usize {
        Self::size_bytes(self.len())
    }

    /// Returns `true` if `index` has a slot.
    #[inline]
    pub fn has_index(&self, index: D) -> bool {
        position(self.bitmap, index.to_index()).is_some()
    }

    /// Returns the value stored for `index`.
    pub fn get(&self, index: D) -> Result<V, SparseError> {
        let at = slot_range::<V>(self.bitmap, index.to_index())?;
        Ok(V::decode(&self.slots[at]))
    }

    /// Returns the present indices in ascending order.
    #[inline]
    pub fn indices(&self) -> Indices<D> {
        Indices::new(self.bitmap)
    }

    /// Iterates `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (D, V)> + use<'a, D, V> {
        let bitmap = self.bitmap;
        let slots: &'a [u8] = self.slots;
        self.indices().filter_map(move |index| {
            let at = slot_range::<V>(bitmap, index.to_index()).ok()?;
            Some((index, V::decode(slots.get(at)?)))
        })
    }
}

impl<'a, D: Domain, V: Slot> SparseArrayMut<'a, D, V> {
    /// Builds a map with the given present indices in `bytes`.
    ///
    /// `bytes` must be exactly [`SparseArray::size_bytes`] of the number of indices. Every slot
    /// starts as `V::default()`.
    pub fn build(
        bytes: &'a mut [u8],
        indices: impl IntoIterator<Item = D>,
    ) -> Result<Self, SparseError> {
        let mut bitmap = 0_u64;
        for index in indices {
            let index = index.to_index();
            let bit = checked_bit::<D>(index)?;
            if bitmap & bit != 0 {
                return Err(SparseError::DuplicateIndex { index });
            }
            bitmap |= bit;
        }

        let expected = SparseArray::<D, V>::size_bytes(bitmap.count_ones() as usize);
        if bytes.len() != expected {
            return Err(SparseError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let (head, slots) = bytes.split_at_mut(D::Bitmap::BYTES);
        D::Bitmap::from_bits(bitmap).write_le(head);
        for slot in slots.chunks_exact_mut(slot_size::<V>()) {
            V::default().encode(slot);
        }
        Ok(Self {
            bitmap,
            slots,
            _marker: PhantomData,
        })
    }

    /// Opens a map previously built in `bytes` for slot updates.
    pub fn view(bytes: &'a mut [u8]) -> Result<Self, SparseError> {
        let bitmap = decode_bitmap::<D, V>(bytes)?;
        let (_, slots) = bytes.split_at_mut(D::Bitmap::BYTES);
        Ok(Self {
            bitmap,
            slots,
            _marker: PhantomData,
        })
    }

    /// Borrows a read-only view.
    #[inline]
    pub fn as_view(&self) -> SparseArray<'_, D, V> {
        SparseArray {
            bitmap: self.bitmap,
            slots: &self.slots[..],
            _marker: PhantomData,
        }
    }

    /// Number of present indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.bitmap.count_ones() as usize
    }

    /// Returns `true` if no index is present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap == 0
    }

    /// Returns `true` if `index` has a slot.
    #[inline]
    pub fn has_index(&self, index: D) -> bool {
        position(self.bitmap, index.to_index()).is_some()
    }

    /// Returns the value stored for `index`.
    pub fn get(&self, index: D) -> Result<V, SparseError> {
        self.as_view().get(index)
    }

    /// Stores `value` in the slot for `index`.
    pub fn set(&mut self, index: D, value: V) -> Result<(), SparseError> {
        let at = slot_range::<V>(self.bitmap, index.to_index())?;
        value.encode(&mut self.slots[at]);
        Ok(())
    }

    /// Returns the present indices in ascending order.
    #[inline]
    pub fn indices(&self) -> Indices<D> {
        Indices::new(self.bitmap)
    }
}

/// Ascending iterator over the present indices of a sparse map.
///
/// The iterator is a copy of the bitmap, so it can be restarted or cloned freely without touching
/// the map. Bits the domain cannot map back to a value are skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Indices<D> {
    remaining: u64,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Domain> Indices<D> {
    fn new(bitmap: u64) -> Self {
        let mut remaining = bitmap;
        let mut bits = bitmap;
        while bits != 0 {
            let index = bits.trailing_zeros();
            bits &= bits - 1;
            if D::from_index(index as usize).is_none() {
                remaining &= !(1_u64 << index);
            }
        }
        Self {
            remaining,
            _marker: PhantomData,
        }
    }
}

impl<D: Domain> Iterator for Indices<D> {
    type Item = D;

    #[inline]
    fn next(&mut self) -> Option<D> {
        while self.remaining != 0 {
            let index = self.remaining.trailing_zeros() as usize;
            self.remaining &= self.remaining - 1;
            if let Some(value) = D::from_index(index) {
                return Some(value);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl<D: Domain> ExactSizeIterator for Indices<D> {}

impl<D: Domain> FusedIterator for Indices<D> {}

const fn slot_size<V: Slot>() -> usize {
    const { assert!(V::SIZE > 0, "sparse-map slots must have a non-zero size") };
    V::SIZE
}

fn checked_bit<D: Domain>(index: usize) -> Result<u64, SparseError> {
    if index >= D::COUNT || index >= D::Bitmap::BITS as usize {
        return Err(SparseError::IndexOutOfRange {
            index,
            count: D::COUNT,
        });
    }
    Ok(1_u64 << index)
}

#[inline]
fn position(bitmap: u64, index: usize) -> Option<usize> {
    let index = u32::try_from(index).ok().filter(|&i| i < u64::BITS)?;
    if bitmap & (1_u64 << index) == 0 {
        return None;
    }
    Some((bitmap & mask_below(index)).count_ones() as usize)
}

fn slot_range<V: Slot>(bitmap: u64, index: usize) -> Result<core::ops::Range<usize>, SparseError> {
    let pos = position(bitmap, index).ok_or(SparseError::MissingIndex { index })?;
    let size = slot_size::<V>();
    let start = pos * size;
    Ok(start..start + size)
}

fn decode_bitmap<D: Domain, V: Slot>(bytes: &[u8]) -> Result<u64, SparseError> {
    let bitmap = D::Bitmap::read_le(bytes)
        .ok_or(SparseError::SizeMismatch {
            expected: D::Bitmap::BYTES,
            actual: bytes.len(),
        })?
        .to_bits();

    let stray = bitmap & !mask_below(u32::try_from(D::COUNT).unwrap_or(u32::MAX));
    if stray != 0 {
        return Err(SparseError::IndexOutOfRange {
            index: stray.trailing_zeros() as usize,
            count: D::COUNT,
        });
    }

    let expected = SparseArray::<D, V>::size_bytes(bitmap.count_ones() as usize);
    if bytes.len() != expected {
        return Err(SparseError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bitmap)
}
