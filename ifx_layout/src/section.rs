// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section kinds carried by fragments and collected into output sections.

use core::fmt;
use core::str::FromStr;

use crate::bitmap::BitmapFor;
use crate::sparse::Domain;

const SECTION_KIND_COUNT: usize = 18;

/// The kind of a fragment section.
///
/// Declaration order is the output-section order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SectionKind {
    /// Executable code.
    Text,
    /// Initialized writable data.
    Data,
    /// Zero-initialized writable data.
    Bss,
    /// Data that is read-only after relocation.
    RelRo,
    /// Mergeable NUL-terminated strings of 1-byte characters.
    Mergeable1ByteCString,
    /// Mergeable NUL-terminated strings of 2-byte characters.
    Mergeable2ByteCString,
    /// Mergeable NUL-terminated strings of 4-byte characters.
    Mergeable4ByteCString,
    /// Mergeable 4-byte constants.
    MergeableConst4,
    /// Mergeable 8-byte constants.
    MergeableConst8,
    /// Mergeable 16-byte constants.
    MergeableConst16,
    /// Mergeable 32-byte constants.
    MergeableConst32,
    /// Read-only data.
    ReadOnly,
    /// Initialized thread-local data.
    ThreadData,
    /// Zero-initialized thread-local data.
    ThreadBss,
    /// Debug line table.
    DebugLine,
    /// Debug strings.
    DebugString,
    /// Debug address ranges.
    DebugRanges,
    /// Linked definitions.
    LinkedDefinitions,
}

impl SectionKind {
    /// Every section kind in ascending order.
    pub const ALL: [Self; SECTION_KIND_COUNT] = [
        Self::Text,
        Self::Data,
        Self::Bss,
        Self::RelRo,
        Self::Mergeable1ByteCString,
        Self::Mergeable2ByteCString,
        Self::Mergeable4ByteCString,
        Self::MergeableConst4,
        Self::MergeableConst8,
        Self::MergeableConst16,
        Self::MergeableConst32,
        Self::ReadOnly,
        Self::ThreadData,
        Self::ThreadBss,
        Self::DebugLine,
        Self::DebugString,
        Self::DebugRanges,
        Self::LinkedDefinitions,
    ];

    /// Returns the diagnostic name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Data => "data",
            Self::Bss => "bss",
            Self::RelRo => "rel_ro",
            Self::Mergeable1ByteCString => "mergeable_1_byte_c_string",
            Self::Mergeable2ByteCString => "mergeable_2_byte_c_string",
            Self::Mergeable4ByteCString => "mergeable_4_byte_c_string",
            Self::MergeableConst4 => "mergeable_const_4",
            Self::MergeableConst8 => "mergeable_const_8",
            Self::MergeableConst16 => "mergeable_const_16",
            Self::MergeableConst32 => "mergeable_const_32",
            Self::ReadOnly => "read_only",
            Self::ThreadData => "thread_data",
            Self::ThreadBss => "thread_bss",
            Self::DebugLine => "debug_line",
            Self::DebugString => "debug_string",
            Self::DebugRanges => "debug_ranges",
            Self::LinkedDefinitions => "linked_definitions",
        }
    }

    /// Returns the position of the kind in [`Self::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Domain for SectionKind {
    const COUNT: usize = SECTION_KIND_COUNT;
    type Bitmap = BitmapFor<{ SECTION_KIND_COUNT }>;

    #[inline]
    fn to_index(self) -> usize {
        self.index()
    }

    #[inline]
    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown section-kind name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseSectionKindError;

impl fmt::Display for ParseSectionKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section kind")
    }
}

impl core::error::Error for ParseSectionKindError {}

impl FromStr for SectionKind {
    type Err = ParseSectionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or(ParseSectionKindError)
    }
}
