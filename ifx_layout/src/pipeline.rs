// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scan / layout / copy pipeline.
//!
//! - **scan** reserves arena storage for one section-kind sparse map per fragment that carries two
//!   or more sections. Single-section fragments cannot have internal fixups and get no map.
//! - **layout** appends one [`Contribution`] per fragment section to the output section of that
//!   kind, and back-fills the fragment's map slot with a [`ContributionRef`] to the new record.
//! - **copy** walks the output sections in kind order and, for every contribution with a map,
//!   resolves each sibling contribution through it.
//!
//! Each phase needs the complete output of the previous one: a slot may be filled by a later
//! iteration of layout, so nothing may read the maps before layout returns.
//!
//! Cross references are handles rather than addresses: a contribution names its fragment by
//! [`FragmentId`] and its map by [`MapHandle`], and map slots name contributions by
//! [`ContributionRef`]. Handles stay valid because none of the collections ever removes or moves
//! an element.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::vec::Vec;
use core::fmt;

use crate::chunked::{ChunkError, ChunkedSequence, Region};
use crate::fragment::{Fragment, FragmentId};
use crate::report::{ContributionDetail, CopyReport, SectionReport, SiblingDetail};
use crate::reserve::{ReserveError, reserve_detailed};
use crate::section::SectionKind;
use crate::sparse::{Domain, Slot, SparseArray, SparseArrayMut, SparseError};
use crate::trace::{Phase, ReserveEvent, TraceMask, TraceSink, in_phase};

/// Pipeline errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// Configuration was rejected.
    Limits(crate::limits::LimitsError),
    /// Arena growth failed.
    Chunk(ChunkError),
    /// A storage reservation failed.
    Reserve(ReserveError),
    /// A sparse-map operation failed.
    Sparse(SparseError),
    /// Two fragments share a name.
    DuplicateFragmentName {
        /// The repeated name.
        name: Box<str>,
    },
    /// More fragments than a [`FragmentId`] can number.
    TooManyFragments,
    /// More contributions in one output section than a [`ContributionRef`] can number.
    TooManyContributions {
        /// The overflowing output section.
        section: SectionKind,
    },
    /// The map table does not have one entry per fragment.
    MapCountMismatch {
        /// Number of fragments.
        fragments: usize,
        /// Number of map entries.
        maps: usize,
    },
    /// A region does not name storage in the arena.
    UnknownRegion {
        /// The offending region.
        region: Region,
    },
    /// A fragment id does not name an input fragment.
    UnknownFragment {
        /// The offending id.
        fragment: FragmentId,
    },
    /// A contribution reference does not name a contribution.
    UnknownContribution {
        /// The offending reference.
        contribution: ContributionRef,
    },
    /// A map slot was never filled by layout.
    UnfilledSlot {
        /// Fragment that owns the map.
        fragment: FragmentId,
        /// The empty slot.
        section: SectionKind,
    },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limits(err) => write!(f, "invalid limits: {err}"),
            Self::Chunk(err) => write!(f, "{err}"),
            Self::Reserve(err) => write!(f, "{err}"),
            Self::Sparse(err) => write!(f, "{err}"),
            Self::DuplicateFragmentName { name } => write!(f, "duplicate fragment name: {name}"),
            Self::TooManyFragments => write!(f, "too many fragments"),
            Self::TooManyContributions { section } => {
                write!(f, "too many contributions in output section {section}")
            }
            Self::MapCountMismatch { fragments, maps } => {
                write!(
                    f,
                    "map table does not match fragments: fragments={fragments} maps={maps}"
                )
            }
            Self::UnknownRegion { region } => write!(
                f,
                "region does not name arena storage: start={} len={}",
                region.start(),
                region.len()
            ),
            Self::UnknownFragment { fragment } => {
                write!(f, "unknown fragment id: {}", fragment.as_u32())
            }
            Self::UnknownContribution { contribution } => write!(
                f,
                "unknown contribution: section={} index={}",
                contribution.section(),
                contribution.index()
            ),
            Self::UnfilledSlot { fragment, section } => write!(
                f,
                "sparse map slot never filled: fragment={} section={section}",
                fragment.as_u32()
            ),
        }
    }
}

impl core::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Limits(err) => Some(err),
            Self::Chunk(err) => Some(err),
            Self::Reserve(err) => Some(err),
            Self::Sparse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChunkError> for LinkError {
    fn from(err: ChunkError) -> Self {
        Self::Chunk(err)
    }
}

impl From<ReserveError> for LinkError {
    fn from(err: ReserveError) -> Self {
        Self::Reserve(err)
    }
}

impl From<SparseError> for LinkError {
    fn from(err: SparseError) -> Self {
        Self::Sparse(err)
    }
}

impl From<crate::limits::LimitsError> for LinkError {
    fn from(err: crate::limits::LimitsError) -> Self {
        Self::Limits(err)
    }
}

/// Handle to a contribution: output section plus append position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributionRef {
    section: SectionKind,
    index: u32,
}

impl ContributionRef {
    /// Creates a reference to contribution `index` of output section `section`.
    #[inline]
    pub const fn new(section: SectionKind, index: u32) -> Self {
        Self { section, index }
    }

    /// The output section.
    #[inline]
    pub const fn section(self) -> SectionKind {
        self.section
    }

    /// Position within the output section.
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }
}

/// Slot encoding: byte 0 is a presence tag, byte 1 the section kind, bytes 4..8 the index.
impl Slot for Option<ContributionRef> {
    const SIZE: usize = 8;
    const ALIGN: usize = 4;

    fn encode(self, out: &mut [u8]) {
        let Some(dst) = out.first_chunk_mut::<8>() else {
            return;
        };
        *dst = [0; 8];
        if let Some(r) = self {
            dst[0] = 1;
            dst[1] = r.section as u8;
            dst[4..].copy_from_slice(&r.index.to_le_bytes());
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        let src = bytes.first_chunk::<8>()?;
        if src[0] == 0 {
            return None;
        }
        let section = SectionKind::from_index(usize::from(src[1]))?;
        let index = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
        Some(ContributionRef::new(section, index))
    }
}

/// Read-only view of a fragment's section map.
pub type SectionMap<'a> = SparseArray<'a, SectionKind, Option<ContributionRef>>;

/// Mutable view of a fragment's section map.
pub type SectionMapMut<'a> = SparseArrayMut<'a, SectionKind, Option<ContributionRef>>;

/// Handle to a section map stored in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapHandle(Region);

impl MapHandle {
    /// The arena storage holding the map.
    #[inline]
    pub const fn region(self) -> Region {
        self.0
    }
}

/// One fragment section placed in an output section.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    /// Section kind (and so the output section) of the contribution.
    pub section: SectionKind,
    /// Fragment the section came from.
    pub fragment: FragmentId,
    /// The fragment's section map, if it has one.
    pub sections: Option<MapHandle>,
}

/// Output sections keyed by kind, each an append-only sequence of contributions.
///
/// Iteration is in ascending section-kind order.
#[derive(Debug)]
pub struct OutputSections {
    sections: BTreeMap<SectionKind, ChunkedSequence<Contribution>>,
    chunk_len: usize,
}

impl OutputSections {
    /// Creates an empty set whose sequences use chunks of `chunk_len` contributions.
    pub fn new(chunk_len: usize) -> Result<Self, ChunkError> {
        // Validate once up front rather than on first insertion.
        ChunkedSequence::<Contribution>::with_chunk_capacity(chunk_len)?;
        Ok(Self {
            sections: BTreeMap::new(),
            chunk_len,
        })
    }

    /// Appends `contribution` to the output section of its kind.
    pub fn push(&mut self, contribution: Contribution) -> Result<ContributionRef, LinkError> {
        let section = contribution.section;
        let seq = match self.sections.entry(section) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(ChunkedSequence::with_chunk_capacity(self.chunk_len)?)
            }
        };
        let index =
            u32::try_from(seq.len()).map_err(|_| LinkError::TooManyContributions { section })?;
        seq.push(contribution)?;
        Ok(ContributionRef::new(section, index))
    }

    /// Returns the contribution named by `at`.
    pub fn get(&self, at: ContributionRef) -> Option<&Contribution> {
        self.sections.get(&at.section)?.get(at.index as usize)
    }

    /// Returns the contributions of one output section.
    pub fn section(&self, kind: SectionKind) -> Option<&ChunkedSequence<Contribution>> {
        self.sections.get(&kind)
    }

    /// Iterates output sections in ascending kind order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKind, &ChunkedSequence<Contribution>)> {
        self.sections.iter().map(|(k, v)| (*k, v))
    }

    /// Number of non-empty output sections.
    #[inline]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if no contribution was placed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of contributions across all output sections.
    pub fn contribution_count(&self) -> usize {
        self.sections.values().map(ChunkedSequence::len).sum()
    }
}

/// The output of [`scan`]: one optional map per fragment, indexed by [`FragmentId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentMaps {
    maps: Vec<Option<MapHandle>>,
    padding_bytes: usize,
    wasted_bytes: usize,
}

impl FragmentMaps {
    /// The map of `fragment`, if it has one.
    #[inline]
    pub fn get(&self, fragment: FragmentId) -> Option<MapHandle> {
        self.maps.get(fragment.index()).copied().flatten()
    }

    /// One entry per fragment, in input order.
    #[inline]
    pub fn as_slice(&self) -> &[Option<MapHandle>] {
        &self.maps
    }

    /// Number of fragments covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Returns `true` if no fragment was scanned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Number of fragments that received a map.
    pub fn map_count(&self) -> usize {
        self.maps.iter().flatten().count()
    }

    /// Alignment padding spent across all map reservations.
    #[inline]
    pub fn padding_bytes(&self) -> usize {
        self.padding_bytes
    }

    /// Chunk tails abandoned across all map reservations.
    #[inline]
    pub fn wasted_bytes(&self) -> usize {
        self.wasted_bytes
    }
}

pub(crate) fn fragment_id(index: usize) -> Result<FragmentId, LinkError> {
    u32::try_from(index)
        .map(FragmentId::new)
        .map_err(|_| LinkError::TooManyFragments)
}

/// Allocates a section map for every fragment with two or more sections.
pub fn scan(
    storage: &mut ChunkedSequence<u8>,
    fragments: &[Fragment],
    trace: &mut dyn TraceSink,
) -> Result<FragmentMaps, LinkError> {
    in_phase(trace, Phase::Scan, |trace| -> Result<FragmentMaps, LinkError> {
        let mask = trace.mask();
        let mut out = FragmentMaps {
            maps: Vec::with_capacity(fragments.len()),
            ..FragmentMaps::default()
        };
        for (index, fragment) in fragments.iter().enumerate() {
            let id = fragment_id(index)?;
            let count = fragment.section_count();
            if count < 2 {
                out.maps.push(None);
                continue;
            }

            let Some(reservation) =
                reserve_detailed(storage, SectionMap::size_bytes(count), SectionMap::ALIGN)?
            else {
                out.maps.push(None);
                continue;
            };
            out.padding_bytes += reservation.padding;
            out.wasted_bytes += reservation.wasted;
            if mask.contains(TraceMask::RESERVE) {
                trace.reserve(&ReserveEvent {
                    fragment: id,
                    region: reservation.region,
                    padding: reservation.padding,
                    wasted: reservation.wasted,
                });
            }

            let bytes = storage
                .contiguous_mut(reservation.region)
                .ok_or(LinkError::UnknownRegion {
                    region: reservation.region,
                })?;
            let map = SectionMapMut::build(bytes, fragment.sections())?;
            if mask.contains(TraceMask::MAP) {
                trace.map_built(id, map.len());
            }
            out.maps.push(Some(MapHandle(reservation.region)));
        }
        Ok(out)
    })
}

/// Places every fragment section into its output section and back-fills the fragment maps.
pub fn layout(
    storage: &mut ChunkedSequence<u8>,
    fragments: &[Fragment],
    maps: &FragmentMaps,
    contribution_chunk_len: usize,
    trace: &mut dyn TraceSink,
) -> Result<OutputSections, LinkError> {
    if maps.len() != fragments.len() {
        return Err(LinkError::MapCountMismatch {
            fragments: fragments.len(),
            maps: maps.len(),
        });
    }
    in_phase(trace, Phase::Layout, |trace| -> Result<OutputSections, LinkError> {
        let traced = trace.mask().contains(TraceMask::CONTRIBUTION);
        let mut outputs = OutputSections::new(contribution_chunk_len)?;
        for (index, (fragment, map)) in fragments.iter().zip(maps.as_slice()).enumerate() {
            let id = fragment_id(index)?;
            for section in fragment.sections() {
                let at = outputs.push(Contribution {
                    section,
                    fragment: id,
                    sections: *map,
                })?;
                if traced {
                    trace.contribution(at, id);
                }
                if let Some(handle) = map {
                    let bytes = storage
                        .contiguous_mut(handle.region())
                        .ok_or(LinkError::UnknownRegion {
                            region: handle.region(),
                        })?;
                    SectionMapMut::view(bytes)?.set(section, Some(at))?;
                }
            }
        }
        Ok(outputs)
    })
}

/// Walks the output sections and resolves each contribution's siblings through its map.
pub fn copy(
    storage: &ChunkedSequence<u8>,
    fragments: &[Fragment],
    outputs: &OutputSections,
    trace: &mut dyn TraceSink,
) -> Result<CopyReport, LinkError> {
    in_phase(trace, Phase::Copy, |_| -> Result<CopyReport, LinkError> {
        let mut report = CopyReport::default();
        for (kind, contributions) in outputs.iter() {
            let mut section = SectionReport {
                section: kind,
                contributions: Vec::with_capacity(contributions.len()),
            };
            for (index, contribution) in contributions.iter().enumerate() {
                let at = ContributionRef::new(
                    kind,
                    u32::try_from(index)
                        .map_err(|_| LinkError::TooManyContributions { section: kind })?,
                );
                let siblings = match contribution.sections {
                    None => None,
                    Some(handle) => Some(siblings(
                        storage,
                        fragments,
                        outputs,
                        contribution.fragment,
                        handle,
                    )?),
                };
                section.contributions.push(ContributionDetail {
                    contribution: at,
                    fragment: fragment_name(fragments, contribution.fragment)?.into(),
                    siblings,
                });
            }
            report.sections.push(section);
        }
        Ok(report)
    })
}

/// Opens the section map stored at `handle`.
pub fn open_map(
    storage: &ChunkedSequence<u8>,
    handle: MapHandle,
) -> Result<SectionMap<'_>, LinkError> {
    let bytes = storage
        .contiguous(handle.region())
        .ok_or(LinkError::UnknownRegion {
            region: handle.region(),
        })?;
    Ok(SectionMap::view(bytes)?)
}

fn siblings(
    storage: &ChunkedSequence<u8>,
    fragments: &[Fragment],
    outputs: &OutputSections,
    owner: FragmentId,
    handle: MapHandle,
) -> Result<Vec<SiblingDetail>, LinkError> {
    let map = open_map(storage, handle)?;
    let mut out = Vec::with_capacity(map.len());
    for (section, slot) in map.iter() {
        let at = slot.ok_or(LinkError::UnfilledSlot {
            fragment: owner,
            section,
        })?;
        let sibling = outputs
            .get(at)
            .ok_or(LinkError::UnknownContribution { contribution: at })?;
        out.push(SiblingDetail {
            section,
            contribution: at,
            fragment: fragment_name(fragments, sibling.fragment)?.into(),
        });
    }
    Ok(out)
}

fn fragment_name(fragments: &[Fragment], id: FragmentId) -> Result<&str, LinkError> {
    fragments
        .get(id.index())
        .map(Fragment::name)
        .ok_or(LinkError::UnknownFragment { fragment: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoTrace;
    use alloc::vec;

    fn frag(name: &str, sections: &[SectionKind]) -> Fragment {
        Fragment::new(name, sections.iter().copied()).unwrap()
    }

    #[test]
    fn contribution_ref_slot_encoding() {
        let r = ContributionRef::new(SectionKind::ReadOnly, 0x0102_0304);
        let mut buf = [0xFF_u8; 8];
        Some(r).encode(&mut buf);
        assert_eq!(buf, [1, 11, 0, 0, 4, 3, 2, 1]);
        assert_eq!(<Option<ContributionRef>>::decode(&buf), Some(r));

        None::<ContributionRef>.encode(&mut buf);
        assert_eq!(buf, [0; 8]);
        assert_eq!(<Option<ContributionRef>>::decode(&buf), None);
        assert_eq!(<Option<ContributionRef>>::decode(&buf[..7]), None);
    }

    #[test]
    fn section_map_size() {
        // 32-bit bitmap plus 8-byte slots.
        assert_eq!(SectionMap::size_bytes(2), 20);
        assert_eq!(SectionMap::size_bytes(4), 36);
        assert_eq!(SectionMap::ALIGN, 4);
    }

    #[test]
    fn scan_skips_single_section_fragments() {
        let fragments = vec![
            frag("a", &[SectionKind::Text]),
            frag("b", &[SectionKind::Text, SectionKind::Bss]),
            frag("c", &[]),
        ];
        let mut storage = ChunkedSequence::new();
        let maps = scan(&mut storage, &fragments, &mut NoTrace).unwrap();
        assert_eq!(maps.len(), 3);
        assert_eq!(maps.map_count(), 1);
        assert!(maps.get(FragmentId::new(0)).is_none());
        let b = maps.get(FragmentId::new(1)).unwrap();
        assert_eq!(b.region().len(), SectionMap::size_bytes(2));

        let map = open_map(&storage, b).unwrap();
        assert_eq!(
            map.indices().collect::<Vec<_>>(),
            vec![SectionKind::Text, SectionKind::Bss]
        );
        assert_eq!(map.get(SectionKind::Bss), Ok(None));
    }

    #[test]
    fn layout_rejects_mismatched_map_table() {
        let fragments = vec![frag("a", &[SectionKind::Text])];
        let mut storage = ChunkedSequence::new();
        let err = layout(
            &mut storage,
            &fragments,
            &FragmentMaps::default(),
            16,
            &mut NoTrace,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LinkError::MapCountMismatch {
                fragments: 1,
                maps: 0
            }
        );
    }

    #[test]
    fn layout_backfills_maps() {
        let fragments = vec![
            frag("a", &[SectionKind::Text, SectionKind::Data]),
            frag("b", &[SectionKind::Data, SectionKind::Text]),
        ];
        let mut storage = ChunkedSequence::new();
        let maps = scan(&mut storage, &fragments, &mut NoTrace).unwrap();
        let outputs = layout(&mut storage, &fragments, &maps, 4, &mut NoTrace).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.contribution_count(), 4);

        let b = open_map(&storage, maps.get(FragmentId::new(1)).unwrap()).unwrap();
        assert_eq!(
            b.get(SectionKind::Text),
            Ok(Some(ContributionRef::new(SectionKind::Text, 1)))
        );
        assert_eq!(
            b.get(SectionKind::Data),
            Ok(Some(ContributionRef::new(SectionKind::Data, 1)))
        );
        let c = outputs
            .get(ContributionRef::new(SectionKind::Data, 1))
            .unwrap();
        assert_eq!(c.fragment, FragmentId::new(1));
        assert_eq!(c.sections, maps.get(FragmentId::new(1)));
    }

    #[test]
    fn output_sections_grow_across_chunks() {
        let mut outputs = OutputSections::new(2).unwrap();
        let mut refs = Vec::new();
        for i in 0..7 {
            refs.push(
                outputs
                    .push(Contribution {
                        section: SectionKind::Data,
                        fragment: FragmentId::new(i),
                        sections: None,
                    })
                    .unwrap(),
            );
        }
        for (i, r) in refs.iter().enumerate() {
            assert_eq!(r.index() as usize, i);
            assert_eq!(outputs.get(*r).unwrap().fragment.index(), i);
        }
        assert_eq!(outputs.section(SectionKind::Data).unwrap().chunk_count(), 4);
        assert!(OutputSections::new(0).is_err());
    }
}
