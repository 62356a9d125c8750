// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The link driver: runs scan and layout and owns the result.

use alloc::boxed::Box;
use core::fmt;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::chunked::ChunkedSequence;
use crate::fragment::{Fragment, FragmentId};
use crate::limits::Limits;
use crate::pipeline::{
    Contribution, ContributionRef, FragmentMaps, LinkError, MapHandle, OutputSections, SectionMap,
    copy, fragment_id, layout, open_map, scan,
};
use crate::report::CopyReport;
use crate::section::SectionKind;
use crate::trace::{NoTrace, TraceSink};

/// Runs links with fixed [`Limits`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Linker {
    limits: Limits,
}

impl Linker {
    /// Creates a linker, rejecting limits no link could satisfy.
    pub fn new(limits: Limits) -> Result<Self, LinkError> {
        limits.validate()?;
        Ok(Self { limits })
    }

    /// The configured limits.
    #[inline]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Scans and lays out `fragments`.
    ///
    /// Fragment names must be unique. The returned [`Link`] is ready for [`Link::copy_report`] and
    /// [`Link::resolve`].
    pub fn link<'f>(
        &self,
        fragments: &'f [Fragment],
        trace: Option<&mut dyn TraceSink>,
    ) -> Result<Link<'f>, LinkError> {
        let mut noop = NoTrace;
        let trace: &mut dyn TraceSink = match trace {
            Some(t) => t,
            None => &mut noop,
        };

        let mut names = HashMap::with_capacity(fragments.len());
        for (index, fragment) in fragments.iter().enumerate() {
            let id = fragment_id(index)?;
            match names.entry(fragment.name()) {
                Entry::Occupied(_) => {
                    return Err(LinkError::DuplicateFragmentName {
                        name: Box::from(fragment.name()),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let mut storage = ChunkedSequence::with_chunk_capacity(self.limits.storage_chunk_bytes)?;
        let maps = scan(&mut storage, fragments, trace)?;
        let outputs = layout(
            &mut storage,
            fragments,
            &maps,
            self.limits.contribution_chunk_len,
            trace,
        )?;
        Ok(Link {
            fragments,
            names,
            storage,
            maps,
            outputs,
        })
    }
}

/// Arena usage of a finished link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Bytes handed out, including padding and wasted chunk tails.
    pub used_bytes: usize,
    /// Bytes allocated across all chunks.
    pub capacity_bytes: usize,
    /// Number of chunks.
    pub chunks: usize,
    /// Number of section maps.
    pub maps: usize,
    /// Alignment padding.
    pub padding_bytes: usize,
    /// Abandoned chunk tails.
    pub wasted_bytes: usize,
}

impl fmt::Display for StorageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Used {} bytes of storage for ifx links", self.used_bytes)
    }
}

/// A laid-out link: the arena, the section maps and the output sections.
#[derive(Debug)]
pub struct Link<'f> {
    fragments: &'f [Fragment],
    names: HashMap<&'f str, FragmentId>,
    storage: ChunkedSequence<u8>,
    maps: FragmentMaps,
    outputs: OutputSections,
}

impl<'f> Link<'f> {
    /// The input fragments.
    #[inline]
    pub fn fragments(&self) -> &'f [Fragment] {
        self.fragments
    }

    /// Returns the fragment with id `id`.
    pub fn fragment(&self, id: FragmentId) -> Option<&'f Fragment> {
        self.fragments.get(id.index())
    }

    /// Looks a fragment up by name.
    pub fn fragment_by_name(&self, name: &str) -> Option<FragmentId> {
        self.names.get(name).copied()
    }

    /// Opens the section map of `fragment`.
    ///
    /// Returns `Ok(None)` for fragments with fewer than two sections.
    pub fn map_of(&self, fragment: FragmentId) -> Result<Option<SectionMap<'_>>, LinkError> {
        if fragment.index() >= self.fragments.len() {
            return Err(LinkError::UnknownFragment { fragment });
        }
        self.maps
            .get(fragment)
            .map(|handle| open_map(&self.storage, handle))
            .transpose()
    }

    /// The map handle of `fragment`, if it has a map.
    pub fn map_handle(&self, fragment: FragmentId) -> Option<MapHandle> {
        self.maps.get(fragment)
    }

    /// The output sections.
    #[inline]
    pub fn outputs(&self) -> &OutputSections {
        &self.outputs
    }

    /// Returns the contribution named by `at`.
    pub fn contribution(&self, at: ContributionRef) -> Option<&Contribution> {
        self.outputs.get(at)
    }

    /// Finds where the `target` section of the fragment owning `from` was placed.
    ///
    /// Returns `Ok(None)` when the fragment has no map or does not carry `target`.
    pub fn resolve(
        &self,
        from: ContributionRef,
        target: SectionKind,
    ) -> Result<Option<ContributionRef>, LinkError> {
        let contribution = self
            .outputs
            .get(from)
            .ok_or(LinkError::UnknownContribution { contribution: from })?;
        let Some(handle) = contribution.sections else {
            return Ok(None);
        };
        let map = open_map(&self.storage, handle)?;
        if !map.has_index(target) {
            return Ok(None);
        }
        map.get(target)?
            .ok_or(LinkError::UnfilledSlot {
                fragment: contribution.fragment,
                section: target,
            })
            .map(Some)
    }

    /// Runs the copy phase over the laid-out link.
    pub fn copy_report(&self, trace: Option<&mut dyn TraceSink>) -> Result<CopyReport, LinkError> {
        let mut noop = NoTrace;
        let trace: &mut dyn TraceSink = match trace {
            Some(t) => t,
            None => &mut noop,
        };
        copy(&self.storage, self.fragments, &self.outputs, trace)
    }

    /// Arena usage.
    pub fn storage_stats(&self) -> StorageStats {
        StorageStats {
            used_bytes: self.storage.len(),
            capacity_bytes: self.storage.capacity(),
            chunks: self.storage.chunk_count(),
            maps: self.maps.map_count(),
            padding_bytes: self.maps.padding_bytes(),
            wasted_bytes: self.maps.wasted_bytes(),
        }
    }

    /// The byte arena holding the section maps.
    #[inline]
    pub fn storage(&self) -> &ChunkedSequence<u8> {
        &self.storage
    }
}
