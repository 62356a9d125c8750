// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use ifx_layout::bitmap::{Bitmap, BitmapFor};
use ifx_layout::{Bounded, SparseArray, SparseArrayMut};

type Small = Bounded<8>;

fn subset(mask: u8) -> Vec<Small> {
    (0..8)
        .filter(|i| mask & (1 << i) != 0)
        .filter_map(Small::new)
        .collect()
}

#[test]
fn bitmap_width_is_the_smallest_that_fits() {
    assert_eq!(<BitmapFor<1> as Bitmap>::BITS, 8);
    assert_eq!(<BitmapFor<5> as Bitmap>::BITS, 8);
    assert_eq!(<BitmapFor<8> as Bitmap>::BITS, 8);
    assert_eq!(<BitmapFor<9> as Bitmap>::BITS, 16);
    assert_eq!(<BitmapFor<20> as Bitmap>::BITS, 32);
    assert_eq!(<BitmapFor<33> as Bitmap>::BITS, 64);
    assert_eq!(<BitmapFor<64> as Bitmap>::BITS, 64);
}

#[test]
fn membership_and_order_for_every_subset() {
    for mask in 0..=u8::MAX {
        let present = subset(mask);
        let size = SparseArray::<Small, u32>::size_bytes(present.len());
        let mut bytes = vec![0_u8; size];
        let mut map = SparseArrayMut::<Small, u32>::build(&mut bytes, present.iter().copied())
            .unwrap();
        for (n, index) in present.iter().enumerate() {
            map.set(*index, u32::try_from(n).unwrap() * 10).unwrap();
        }

        let view = map.as_view();
        assert_eq!(view.footprint(), size);
        assert_eq!(view.len(), present.len());
        for i in 0..8 {
            let index = Small::new(i).unwrap();
            assert_eq!(view.has_index(index), mask & (1 << i) != 0);
        }
        assert_eq!(view.indices().collect::<Vec<_>>(), present);
        for (n, (index, value)) in view.iter().enumerate() {
            assert_eq!(index, present[n]);
            assert_eq!(value, u32::try_from(n).unwrap() * 10);
        }
    }
}

#[test]
fn traversal_is_idempotent() {
    let present = subset(0b1010_0110);
    let mut bytes = vec![0_u8; SparseArray::<Small, u64>::size_bytes(present.len())];
    SparseArrayMut::<Small, u64>::build(&mut bytes, present.iter().copied()).unwrap();

    let view = SparseArray::<Small, u64>::view(&bytes).unwrap();
    let indices = view.indices();
    let first: Vec<_> = indices.collect();
    let second: Vec<_> = indices.collect();
    assert_eq!(first, second);
    assert_eq!(first, present);
    assert_eq!(view.indices().len(), 4);
}

#[test]
fn view_rejects_foreign_storage() {
    let bytes = [0_u8; 5];
    assert!(SparseArray::<Small, u32>::view(&bytes).is_err());
}
