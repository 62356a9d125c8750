// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for `ifx_layout` conformance tests.
//!
//! The tests themselves live under `tests/`.

use ifx_layout::{Fragment, FragmentError, SectionKind};

/// The three-fragment demo input.
///
/// - `f1`: text and data (two-slot map),
/// - `f2`: text only (no map),
/// - `f3`: text, data, 4-byte mergeable constants and read-only data (four-slot map).
pub fn demo_fragments() -> Result<Vec<Fragment>, FragmentError> {
    use SectionKind::{Data, MergeableConst4, ReadOnly, Text};
    Ok(vec![
        Fragment::new("f1", [Text, Data])?,
        Fragment::new("f2", [Text])?,
        Fragment::new("f3", [Text, Data, MergeableConst4, ReadOnly])?,
    ])
}

/// `count` fragments with a deterministic spread of section sets.
///
/// Fragment `i` carries every kind whose bit is set in a rotating mask, so sizes range from zero
/// sections to most of the domain.
pub fn synthetic_fragments(count: usize) -> Result<Vec<Fragment>, FragmentError> {
    let mut out = Vec::with_capacity(count);
    let mut state = 0x9E37_79B9_u32;
    for i in 0..count {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let sections = SectionKind::ALL
            .into_iter()
            .filter(|k| state & (1 << k.index()) != 0);
        out.push(Fragment::new(format!("frag{i}"), sections)?);
    }
    Ok(out)
}
