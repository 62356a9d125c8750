// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::resolver::{
    DefaultLabelResolver, LabelResolver, default_fragment_label, default_phase_label,
};
use ifx_layout::{Phase, ReserveEvent, TraceMask, TraceSink};
use std::string::String;
use std::vec::Vec;

type BackendGuard = tracy_client::Span;

struct PhaseEntry {
    phase: Phase,
    // Keep the label alive for backends that may borrow it.
    label: String,
    guard: Option<BackendGuard>,
}

/// A `TraceSink` that emits Tracy zones and messages via `tracy-client`.
pub struct ProfilingTraceSink<R = DefaultLabelResolver> {
    resolver: R,
    stack: Vec<PhaseEntry>,
    reservations: usize,
}

impl ProfilingTraceSink<DefaultLabelResolver> {
    /// Create a new sink with id-based labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LabelResolver> ProfilingTraceSink<R> {
    /// Create a new sink with a custom label resolver.
    #[must_use]
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            reservations: 0,
        }
    }

    /// Number of reservations observed so far.
    #[must_use]
    pub fn reservations(&self) -> usize {
        self.reservations
    }

    fn on_phase_enter(&mut self, phase: Phase) {
        let label = self
            .resolver
            .phase_label(phase)
            .unwrap_or_else(|| default_phase_label(phase));
        let guard = start_zone(&label);
        self.stack.push(PhaseEntry {
            phase,
            label,
            guard,
        });
    }

    fn on_phase_exit(&mut self, phase: Phase) {
        if self.stack.last().is_some_and(|top| top.phase == phase) {
            if let Some(entry) = self.stack.pop() {
                let PhaseEntry {
                    label: _label,
                    guard: _guard,
                    ..
                } = entry;
                let _ = (_label, _guard);
            }
            return;
        }
        // If the stack got out of sync, drop any active zones to avoid leaking.
        self.drop_active_zones();
    }

    fn on_reserve(&mut self, event: &ReserveEvent) {
        self.reservations += 1;
        let Some(client) = tracy_client::Client::running() else {
            return;
        };
        let fragment = self
            .resolver
            .fragment_label(event.fragment)
            .unwrap_or_else(|| default_fragment_label(event.fragment));
        client.message(&reserve_message(&fragment, event), 0);
    }

    // Drop in LIFO order so nested zones close inner-to-outer.
    fn drop_active_zones(&mut self) {
        while let Some(entry) = self.stack.pop() {
            let PhaseEntry {
                label: _label,
                guard: _guard,
                ..
            } = entry;
            let _ = (_label, _guard);
        }
    }
}

fn start_zone(label: &str) -> Option<BackendGuard> {
    let client = tracy_client::Client::running()?;
    Some(client.span_alloc(Some(label), "ifx_layout.phase", "ifx_layout", 0, 0))
}

fn reserve_message(fragment: &str, event: &ReserveEvent) -> String {
    format!(
        "reserve {fragment}: start={} len={} padding={} wasted={}",
        event.region.start(),
        event.region.len(),
        event.padding,
        event.wasted
    )
}

impl<R: LabelResolver> TraceSink for ProfilingTraceSink<R> {
    fn mask(&self) -> TraceMask {
        TraceMask::PHASE | TraceMask::RESERVE
    }

    fn phase_enter(&mut self, phase: Phase) {
        self.on_phase_enter(phase);
    }

    fn phase_exit(&mut self, phase: Phase) {
        self.on_phase_exit(phase);
    }

    fn reserve(&mut self, event: &ReserveEvent) {
        self.on_reserve(event);
    }
}

impl<R> Default for ProfilingTraceSink<R>
where
    R: LabelResolver + Default,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<R> std::fmt::Debug for ProfilingTraceSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingTraceSink")
            .field("stack_depth", &self.stack.len())
            .field("reservations", &self.reservations)
            .finish_non_exhaustive()
    }
}
