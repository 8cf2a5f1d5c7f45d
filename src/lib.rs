//! Stackgraph turns the `[STACK_SHORT]` section of a database server dump (the short call
//! stacks of every thread, plus the stacks of pending exceptions) into a single merged call
//! graph in the [Graphviz] `dot` format.
//!
//! A dump of a busy server easily holds hundreds of threads, and most of them spend their
//! time in the same handful of functions. Reading those stacks one after the other is
//! painful. Instead, stackgraph unifies every stack frame that appears in more than one
//! thread into a single box, remembers every caller that box was reached from, and counts how
//! many threads pass through it. The more threads go through a frame, the redder its box.
//!
//! # Command-line use
//!
//! ```console
//! $ stackgraph indexserver_host.30003.rtedump.20170515-084744.019134.oom.trc -t
//! $ dot -Tsvg /tmp/stackgraph_output/indexserver_host.30003.rtedump.20170515-084744.019134.oom.trc.dot > stacks.svg
//! ```
//!
//! Pass `-n 5` instead of file names to pick the five first indexserver trace files from the
//! trace directory, optionally narrowed with `--dump-type oom`. See `stackgraph --help` for
//! the full list of options.
//!
//! # Stages
//!
//! Producing a graph happens in a few stages, each of which is available programmatically:
//!
//!  1. [`dump::section`] cuts the bracket-delimited section out of the dump text.
//!  2. [`dump::thread`] splits that section into one record per thread or exception.
//!  3. [`dump::frame`] normalizes each raw stack line into an id and a display label.
//!  4. [`graph`] merges the frames of all threads into one graph.
//!  5. [`graph::dot`] writes that graph, colored by [`graph::color`], as `dot` text.
//!
//! [`batch`] ties these together for a list of dump files, and [`extract`] covers the two
//! sections that are copied out of a dump without any merging.
//!
//!   [Graphviz]: https://graphviz.org/

#![deny(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate log;

/// Reading dump files and taking apart their short stack section.
pub mod dump;

/// Merging the stacks of all threads into one call graph, and writing it out.
pub mod graph;

/// Sections of a dump that are copied out as they are.
pub mod extract;

/// Processing whole dump files into the output directory.
pub mod batch;

/// Finding the trace files of a server installation.
pub mod locate;

mod error;

pub use error::{Error, Result};
