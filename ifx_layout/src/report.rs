// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured copy-phase reporting.
//!
//! The report records, for every contribution in output order, which sibling contributions its
//! fragment's section map resolved to. [`CopyReport`] implements `Display` with a plain
//! indented listing; anything fancier is left to embedders.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::pipeline::ContributionRef;
use crate::section::SectionKind;

/// One sibling resolved through a fragment's section map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiblingDetail {
    /// Section kind of the sibling.
    pub section: SectionKind,
    /// Where the sibling was placed.
    pub contribution: ContributionRef,
    /// Name of the fragment that owns the sibling.
    pub fragment: Box<str>,
}

/// One contribution visited by the copy phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContributionDetail {
    /// The contribution.
    pub contribution: ContributionRef,
    /// Name of the fragment it came from.
    pub fragment: Box<str>,
    /// Siblings in ascending section-kind order, or `None` if the fragment has no map.
    pub siblings: Option<Vec<SiblingDetail>>,
}

/// All contributions of one output section, in append order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionReport {
    /// The output section.
    pub section: SectionKind,
    /// Contributions in append order.
    pub contributions: Vec<ContributionDetail>,
}

/// Result of the copy phase: output sections in ascending kind order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Non-empty output sections.
    pub sections: Vec<SectionReport>,
}

impl CopyReport {
    /// Number of sibling lookups performed.
    pub fn resolved_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.contributions)
            .filter_map(|c| c.siblings.as_ref())
            .map(Vec::len)
            .sum()
    }

    /// Returns the report for one output section.
    pub fn section(&self, kind: SectionKind) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section == kind)
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "section: {}", section.section)?;
            for contribution in &section.contributions {
                writeln!(f, "  {}", contribution.fragment)?;
                for sibling in contribution.siblings.iter().flatten() {
                    writeln!(f, "    {}:{}", sibling.fragment, sibling.section)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
