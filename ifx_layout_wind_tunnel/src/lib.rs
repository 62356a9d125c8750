// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inputs shared by the `ifx_layout` benchmarks under `benches/`.

use ifx_layout::{Fragment, FragmentError, SectionKind};

/// `count` fragments; fragment `i` carries `2 + i % 5` consecutive section kinds starting at kind
/// `i % 18`, wrapping around the end of the kind list.
pub fn staircase_fragments(count: usize) -> Result<Vec<Fragment>, FragmentError> {
    (0..count)
        .map(|i| {
            let first = i % SectionKind::ALL.len();
            let sections = SectionKind::ALL
                .into_iter()
                .cycle()
                .skip(first)
                .take(2 + i % 5);
            Fragment::new(format!("frag{i}"), sections)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staircase_wraps_without_duplicates() {
        let fragments = staircase_fragments(40).unwrap();
        assert_eq!(fragments.len(), 40);
        // Fragment 17 starts at the last kind and wraps to the first.
        assert!(fragments[17].has_section(SectionKind::LinkedDefinitions));
        assert!(fragments[17].has_section(SectionKind::Text));
        assert!(fragments.iter().all(|f| f.section_count() >= 2));
    }
}
