// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the layout pipeline.
//!
//! The core crate carries no logging or profiling dependency. Instead, pipeline phases report to
//! an optional [`TraceSink`]; adapters (for example `ifx_layout_profiling`) turn those callbacks
//! into profiler zones or log records.

use core::ops::BitOr;

use crate::chunked::Region;
use crate::fragment::FragmentId;
use crate::pipeline::ContributionRef;

/// Bitmask that selects which callbacks a [`TraceSink`] receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceMask(u8);

impl TraceMask {
    /// No callbacks.
    pub const NONE: Self = Self(0);
    /// Phase enter/exit.
    pub const PHASE: Self = Self(1 << 0);
    /// Storage reservations.
    pub const RESERVE: Self = Self(1 << 1);
    /// Sparse maps built during scan.
    pub const MAP: Self = Self(1 << 2);
    /// Contributions appended during layout.
    pub const CONTRIBUTION: Self = Self(1 << 3);
    /// Every callback.
    pub const ALL: Self =
        Self(Self::PHASE.0 | Self::RESERVE.0 | Self::MAP.0 | Self::CONTRIBUTION.0);

    /// Returns `true` if this mask contains every bit in `other`.
    #[must_use]
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for TraceMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A pipeline phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Sparse-map allocation.
    Scan,
    /// Contribution placement and map back-filling.
    Layout,
    /// Output traversal and internal fixup resolution.
    Copy,
}

impl Phase {
    /// Returns a stable lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Layout => "layout",
            Self::Copy => "copy",
        }
    }
}

/// A storage reservation made for a fragment's sparse map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveEvent {
    /// Fragment the storage is for.
    pub fragment: FragmentId,
    /// The reserved storage.
    pub region: Region,
    /// Alignment padding in front of `region`.
    pub padding: usize,
    /// Chunk tail abandoned before `region`.
    pub wasted: usize,
}

/// Receives pipeline callbacks.
///
/// Only callbacks selected by [`TraceSink::mask`] are delivered. All callbacks default to no-ops.
pub trait TraceSink {
    /// Returns the callbacks this sink wants.
    fn mask(&self) -> TraceMask;

    /// Called when `phase` starts.
    fn phase_enter(&mut self, _phase: Phase) {}

    /// Called when `phase` finishes successfully or with an error.
    fn phase_exit(&mut self, _phase: Phase) {}

    /// Called after storage is reserved for a sparse map.
    fn reserve(&mut self, _event: &ReserveEvent) {}

    /// Called after a sparse map with `count` slots is built for `fragment`.
    fn map_built(&mut self, _fragment: FragmentId, _count: usize) {}

    /// Called after a contribution is appended to an output section.
    fn contribution(&mut self, _at: ContributionRef, _fragment: FragmentId) {}
}

/// A sink that wants nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }
}

/// Calls `phase_enter`/`phase_exit` around `f` when the sink asked for phases.
pub(crate) fn in_phase<R>(
    trace: &mut dyn TraceSink,
    phase: Phase,
    f: impl FnOnce(&mut dyn TraceSink) -> R,
) -> R {
    let traced = trace.mask().contains(TraceMask::PHASE);
    if traced {
        trace.phase_enter(phase);
    }
    let result = f(&mut *trace);
    if traced {
        trace.phase_exit(phase);
    }
    result
}
