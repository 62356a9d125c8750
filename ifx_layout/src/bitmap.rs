// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presence bitmaps and static bitmap-width selection.
//!
//! A sparse map over a domain of `K` indices needs one bit per index. The bitmap type is chosen
//! at compile time as the smallest of `u8`/`u16`/`u32`/`u64` with at least `K` bits:
//! [`BitmapFor<K>`] names that type and [`bitmap_bits`] is the matching `const fn`.

use core::fmt::Debug;

mod sealed {
    #[allow(unnameable_types, reason = "sealed: only the unsigned integers are bitmaps")]
    pub trait Sealed {}
}

/// A fixed-width unsigned presence bitmap.
///
/// All bit arithmetic is done on the widened `u64` form; the concrete width only decides how many
/// bytes the bitmap occupies when stored.
pub trait Bitmap: Copy + Default + Eq + Debug + sealed::Sealed {
    /// Number of bits in the bitmap.
    const BITS: u32;
    /// Number of bytes the bitmap occupies in storage.
    const BYTES: usize;
    /// Natural alignment of the bitmap type.
    const ALIGN: usize;

    /// Widens the bitmap to `u64`.
    fn to_bits(self) -> u64;

    /// Narrows `bits` to this width, dropping bits that do not fit.
    fn from_bits(bits: u64) -> Self;

    /// Reads a little-endian bitmap from the front of `bytes`.
    fn read_le(bytes: &[u8]) -> Option<Self>;

    /// Writes the bitmap little-endian to the front of `out`.
    ///
    /// Returns `false` if `out` is shorter than [`Self::BYTES`].
    fn write_le(self, out: &mut [u8]) -> bool;
}

macro_rules! impl_bitmap {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Bitmap for $ty {
                const BITS: u32 = <$ty>::BITS;
                const BYTES: usize = core::mem::size_of::<$ty>();
                const ALIGN: usize = core::mem::align_of::<$ty>();

                #[inline]
                fn to_bits(self) -> u64 {
                    u64::from(self)
                }

                #[inline]
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "narrowing is the documented behavior"
                )]
                fn from_bits(bits: u64) -> Self {
                    bits as $ty
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Option<Self> {
                    bytes
                        .first_chunk::<{ core::mem::size_of::<$ty>() }>()
                        .map(|b| <$ty>::from_le_bytes(*b))
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) -> bool {
                    match out.first_chunk_mut::<{ core::mem::size_of::<$ty>() }>() {
                        Some(dst) => {
                            *dst = self.to_le_bytes();
                            true
                        }
                        None => false,
                    }
                }
            }
        )*
    };
}

impl_bitmap!(u8, u16, u32, u64);

/// Type-level carrier for a domain size `K`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Width<const K: usize>;

/// Maps a [`Width`] to the smallest [`Bitmap`] with at least `K` bits.
///
/// Implemented for every `K` in `0..=64`; larger domains do not have a bitmap.
pub trait SelectBitmap {
    /// The selected bitmap type.
    type Bitmap: Bitmap;
}

/// The smallest bitmap type with at least `K` bits.
pub type BitmapFor<const K: usize> = <Width<K> as SelectBitmap>::Bitmap;

macro_rules! select_bitmap {
    ($ty:ty: $($k:literal)*) => {
        $(
            impl SelectBitmap for Width<$k> {
                type Bitmap = $ty;
            }
        )*
    };
}

select_bitmap!(u8: 0 1 2 3 4 5 6 7 8);
select_bitmap!(u16: 9 10 11 12 13 14 15 16);
select_bitmap!(u32: 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32);
select_bitmap!(u64:
    33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48
    49 50 51 52 53 54 55 56 57 58 59 60 61 62 63 64);

/// Returns the bit width [`BitmapFor<count>`] selects, or `None` above 64.
#[must_use]
pub const fn bitmap_bits(count: usize) -> Option<u32> {
    match count {
        0..=8 => Some(8),
        9..=16 => Some(16),
        17..=32 => Some(32),
        33..=64 => Some(64),
        _ => None,
    }
}

/// Mask of the bits strictly below `index`.
#[inline]
pub(crate) const fn mask_below(index: u32) -> u64 {
    if index >= 64 {
        u64::MAX
    } else {
        (1_u64 << index) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of<B: Bitmap>() -> u32 {
        B::BITS
    }

    #[test]
    fn width_is_smallest_fitting_type() {
        assert_eq!(bits_of::<BitmapFor<0>>(), 8);
        assert_eq!(bits_of::<BitmapFor<5>>(), 8);
        assert_eq!(bits_of::<BitmapFor<8>>(), 8);
        assert_eq!(bits_of::<BitmapFor<9>>(), 16);
        assert_eq!(bits_of::<BitmapFor<16>>(), 16);
        assert_eq!(bits_of::<BitmapFor<17>>(), 32);
        assert_eq!(bits_of::<BitmapFor<20>>(), 32);
        assert_eq!(bits_of::<BitmapFor<33>>(), 64);
        assert_eq!(bits_of::<BitmapFor<64>>(), 64);
    }

    #[test]
    fn const_width_matches_selected_type() {
        assert_eq!(bitmap_bits(5), Some(bits_of::<BitmapFor<5>>()));
        assert_eq!(bitmap_bits(20), Some(bits_of::<BitmapFor<20>>()));
        assert_eq!(bitmap_bits(64), Some(64));
        assert_eq!(bitmap_bits(65), None);
        for k in 0..=64 {
            let bits = bitmap_bits(k).unwrap();
            assert!(bits as usize >= k, "k={k}");
            assert!(k <= 8 || bits / 2 < k as u32, "k={k} is not the smallest width");
        }
    }

    #[test]
    fn little_endian_storage() {
        let mut buf = [0_u8; 4];
        assert!(0x0403_0201_u32.write_le(&mut buf));
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(u32::read_le(&buf), Some(0x0403_0201));
        assert_eq!(u32::read_le(&buf[..3]), None);
        assert!(!0_u64.write_le(&mut buf));
        assert_eq!(u16::from_bits(0x1_0203), 0x0203);
    }

    #[test]
    fn mask_below_edges() {
        assert_eq!(mask_below(0), 0);
        assert_eq!(mask_below(3), 0b111);
        assert_eq!(mask_below(63), u64::MAX >> 1);
        assert_eq!(mask_below(64), u64::MAX);
    }
}
