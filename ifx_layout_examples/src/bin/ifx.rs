// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Links a handful of fragments and prints where every section landed.
//!
//! With no arguments the three demo fragments are used. Otherwise each argument describes one
//! fragment as `name=kind,kind,...`, for example:
//!
//! ```text
//! ifx f1=text,data f2=text f3=text,data,mergeable_const_4,read_only
//! ```

use std::error::Error;
use std::process::ExitCode;

use ifx_layout::{Fragment, Linker, SectionKind};
use ifx_layout_profiling::{FragmentNameResolver, ProfilingTraceSink};

fn parse_fragment(arg: &str) -> Result<Fragment, Box<dyn Error>> {
    let (name, kinds) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=kind,...: {arg}"))?;
    let mut sections = Vec::new();
    for kind in kinds.split(',').filter(|k| !k.is_empty()) {
        let kind = kind
            .parse::<SectionKind>()
            .map_err(|err| format!("{err}: {kind}"))?;
        sections.push(kind);
    }
    Ok(Fragment::new(name, sections)?)
}

fn demo_fragments() -> Result<Vec<Fragment>, Box<dyn Error>> {
    use SectionKind::{Data, MergeableConst4, ReadOnly, Text};
    Ok(vec![
        Fragment::new("f1", [Text, Data])?,
        Fragment::new("f2", [Text])?,
        Fragment::new("f3", [Text, Data, MergeableConst4, ReadOnly])?,
    ])
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let fragments = if args.is_empty() {
        demo_fragments()?
    } else {
        args.iter()
            .map(|arg| parse_fragment(arg))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut sink = ProfilingTraceSink::with_resolver(FragmentNameResolver::new(&fragments));
    let link = Linker::default().link(&fragments, Some(&mut sink))?;
    let report = link.copy_report(Some(&mut sink))?;

    print!("{report}");
    println!("{}", link.storage_stats());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ifx: {err}");
            ExitCode::FAILURE
        }
    }
}
