// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linker input fragments.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use core::fmt;

use crate::section::SectionKind;

/// Identifier for a fragment: its position in the input sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FragmentId(u32);

impl FragmentId {
    /// Creates a new fragment id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer backing this id.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into the fragment sequence.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A fragment construction error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FragmentError {
    /// The same section kind was listed twice.
    DuplicateSection {
        /// The repeated kind.
        section: SectionKind,
    },
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSection { section } => {
                write!(f, "fragment lists section kind twice: {section}")
            }
        }
    }
}

impl core::error::Error for FragmentError {}

/// An immutable bundle of sections: one unit of linker input.
///
/// Only the section kinds are modelled; the name exists so diagnostics can show which fragment a
/// contribution came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    name: Box<str>,
    sections: BTreeSet<SectionKind>,
}

impl Fragment {
    /// Creates a fragment carrying `sections`.
    pub fn new(
        name: impl Into<Box<str>>,
        sections: impl IntoIterator<Item = SectionKind>,
    ) -> Result<Self, FragmentError> {
        let mut set = BTreeSet::new();
        for section in sections {
            if !set.insert(section) {
                return Err(FragmentError::DuplicateSection { section });
            }
        }
        Ok(Self {
            name: name.into(),
            sections: set,
        })
    }

    /// Returns the fragment's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates the fragment's section kinds in ascending order.
    pub fn sections(&self) -> impl ExactSizeIterator<Item = SectionKind> + Clone + '_ {
        self.sections.iter().copied()
    }

    /// Number of sections carried.
    #[inline]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if the fragment carries `section`.
    #[inline]
    pub fn has_section(&self, section: SectionKind) -> bool {
        self.sections.contains(&section)
    }
}
