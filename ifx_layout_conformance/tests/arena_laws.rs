// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use ifx_layout::{ChunkedSequence, Limits, Linker, Region, ReserveError, reserve};
use ifx_layout_conformance::synthetic_fragments;

#[test]
fn reservations_are_aligned_ordered_and_disjoint() {
    let mut storage = ChunkedSequence::<u8>::with_chunk_capacity(256).unwrap();
    let mut last: Option<Region> = None;
    for i in 0..500_usize {
        let required = 1 + (i * 7) % 60;
        let align = 1 << (i % 4);
        let region = reserve(&mut storage, required, align).unwrap().unwrap();
        assert_eq!(region.len(), required);

        let bytes = storage.contiguous(region).unwrap();
        assert_eq!(bytes.len(), required);
        assert_eq!(storage.address_of(region.start()).unwrap() % align, 0);

        if let Some(prev) = last {
            assert!(region.start() >= prev.end());
        }
        last = Some(region);
    }
    assert!(storage.chunk_count() > 1);
}

#[test]
fn addresses_survive_further_growth() {
    let mut storage = ChunkedSequence::<u8>::with_chunk_capacity(128).unwrap();
    let first = reserve(&mut storage, 16, 8).unwrap().unwrap();
    storage
        .contiguous_mut(first)
        .unwrap()
        .copy_from_slice(&[0xAB; 16]);
    let address = storage.address_of(first.start()).unwrap();

    for _ in 0..1000 {
        reserve(&mut storage, 24, 4).unwrap().unwrap();
    }

    assert_eq!(storage.address_of(first.start()), Some(address));
    assert_eq!(storage.contiguous(first).unwrap(), &[0xAB; 16]);
}

#[test]
fn oversized_requests_are_rejected() {
    let mut storage = ChunkedSequence::<u8>::with_chunk_capacity(64).unwrap();
    assert_eq!(
        reserve(&mut storage, 62, 4),
        Err(ReserveError::CapacityExceeded {
            required: 62,
            align: 4,
            chunk_capacity: 64
        })
    );
    assert!(storage.is_empty());
    assert_eq!(reserve(&mut storage, 61, 4).unwrap().map(|r| r.len()), Some(61));
}

#[test]
fn small_chunks_link_many_fragments() {
    let fragments = synthetic_fragments(300).unwrap();
    let limits = Limits {
        storage_chunk_bytes: Limits::MIN_STORAGE_CHUNK_BYTES,
        contribution_chunk_len: 3,
    };
    let link = Linker::new(limits).unwrap().link(&fragments, None).unwrap();
    let stats = link.storage_stats();

    let expected_maps = fragments.iter().filter(|f| f.section_count() >= 2).count();
    assert_eq!(stats.maps, expected_maps);
    assert!(stats.chunks > 1);
    assert!(stats.used_bytes <= stats.capacity_bytes);

    // Every map stays readable and complete after all later growth.
    for (index, fragment) in fragments.iter().enumerate() {
        let id = ifx_layout::FragmentId::new(u32::try_from(index).unwrap());
        match link.map_of(id).unwrap() {
            None => assert!(fragment.section_count() < 2),
            Some(map) => {
                assert_eq!(map.len(), fragment.section_count());
                assert!(map.iter().all(|(_, slot)| slot.is_some()));
            }
        }
    }
    assert_eq!(
        link.copy_report(None).unwrap().sections.len(),
        link.outputs().len()
    );
}
