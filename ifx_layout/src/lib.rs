// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memory-layout core for an incremental linker.
//!
//! A link takes an ordered list of [`Fragment`]s, each carrying a set of [`SectionKind`]s, and
//! gathers every fragment section into the output section of its kind. Fragments with two or more
//! sections also get a small bitmap-indexed sparse map, stored in a segmented byte arena, that
//! maps each of their section kinds to the [`ContributionRef`] where that section landed. Internal
//! fixups (one section of a fragment referring to another section of the same fragment) are
//! resolved through that map.
//!
//! ## Building blocks
//! - [`ChunkedSequence`]: append-only storage made of fixed-capacity chunks. Elements never move.
//! - [`reserve`]: carves an aligned, contiguous [`Region`] out of a byte `ChunkedSequence`
//!   without ever straddling a chunk boundary.
//! - [`SparseArray`] / [`SparseArrayMut`]: views over a bitmap-plus-slots map built in a byte
//!   slice, with the bitmap width chosen from the domain size at compile time.
//!
//! ## Pipeline
//! [`Linker::link`] runs [`scan`] (allocate maps) and then [`layout`] (place contributions and
//! back-fill the maps). [`Link::copy_report`] runs [`copy`], which walks the output and resolves
//! every contribution's siblings.
//!
//! ```
//! use ifx_layout::{ContributionRef, Fragment, Linker, SectionKind};
//!
//! let fragments = [
//!     Fragment::new("f1", [SectionKind::Text, SectionKind::Data])?,
//!     Fragment::new("f2", [SectionKind::Text])?,
//! ];
//! let link = Linker::default().link(&fragments, None)?;
//! let f1_text = ContributionRef::new(SectionKind::Text, 0);
//! assert_eq!(
//!     link.resolve(f1_text, SectionKind::Data)?,
//!     Some(ContributionRef::new(SectionKind::Data, 0))
//! );
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```
//!
//! The crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod bitmap;
pub mod chunked;
pub mod fragment;
pub mod limits;
pub mod link;
pub mod pipeline;
pub mod report;
pub mod reserve;
pub mod section;
pub mod sparse;
pub mod trace;

pub use chunked::{ChunkError, ChunkedSequence, Region};
pub use fragment::{Fragment, FragmentError, FragmentId};
pub use limits::{Limits, LimitsError};
pub use link::{Link, Linker, StorageStats};
pub use pipeline::{
    Contribution, ContributionRef, FragmentMaps, LinkError, MapHandle, OutputSections, SectionMap,
    SectionMapMut, copy, layout, open_map, scan,
};
pub use report::{ContributionDetail, CopyReport, SectionReport, SiblingDetail};
pub use reserve::{Reservation, ReserveError, reserve, reserve_detailed};
pub use section::{ParseSectionKindError, SectionKind};
pub use sparse::{Bounded, Domain, Indices, Slot, SparseArray, SparseArrayMut, SparseError};
pub use trace::{NoTrace, Phase, ReserveEvent, TraceMask, TraceSink};
