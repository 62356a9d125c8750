// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Profiling adapters for `ifx_layout` (currently Tracy).
//!
//! This crate is `std`-only and keeps `ifx_layout` itself free of profiling dependencies.
//! It listens for phase enter/exit callbacks and emits matching profiling zones; storage
//! reservations are emitted as Tracy messages.
//!
//! ## Backend
//! This crate currently supports the Tracy backend via `tracy-client`.
//!
//! ## Example
//! ```ignore
//! use ifx_layout::Linker;
//! use ifx_layout_profiling::{FragmentNameResolver, ProfilingTraceSink};
//!
//! let mut sink = ProfilingTraceSink::with_resolver(FragmentNameResolver::new(&fragments));
//! let link = Linker::default().link(&fragments, Some(&mut sink))?;
//! # Ok::<(), ifx_layout::LinkError>(())
//! ```

mod resolver;
mod sink;

pub use resolver::{DefaultLabelResolver, FragmentNameResolver, LabelResolver};
pub use sink::ProfilingTraceSink;
