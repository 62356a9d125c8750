// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use ifx_layout::{Fragment, FragmentId, Phase};
use std::string::String;
use std::vec::Vec;

/// Optional label resolver for profiling zones and messages.
///
/// Return `None` to fall back to the default labels.
pub trait LabelResolver {
    /// Resolve a label for a phase zone.
    fn phase_label(&mut self, _phase: Phase) -> Option<String> {
        None
    }

    /// Resolve a label for a fragment in reservation messages.
    fn fragment_label(&mut self, _fragment: FragmentId) -> Option<String> {
        None
    }
}

/// Default resolver that keeps stable id-based labels.
#[derive(Default, Debug)]
pub struct DefaultLabelResolver;

impl LabelResolver for DefaultLabelResolver {}

/// Resolver that labels fragments by name.
#[derive(Default, Debug)]
pub struct FragmentNameResolver {
    names: Vec<String>,
}

impl FragmentNameResolver {
    /// Captures the names of `fragments`, indexed by [`FragmentId`].
    pub fn new(fragments: &[Fragment]) -> Self {
        Self {
            names: fragments.iter().map(|f| String::from(f.name())).collect(),
        }
    }
}

impl LabelResolver for FragmentNameResolver {
    fn fragment_label(&mut self, fragment: FragmentId) -> Option<String> {
        let name = self.names.get(fragment.index())?;
        Some(format!("fragment:{name}"))
    }
}

pub(crate) fn default_phase_label(phase: Phase) -> String {
    format!("ifx.{}", phase.name())
}

pub(crate) fn default_fragment_label(fragment: FragmentId) -> String {
    format!("fragment:{}", fragment.as_u32())
}
