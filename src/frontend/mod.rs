//! Host side of a generation pass
//!
//! This module turns what a build hands the generators into pass input:
//! - `source`: declaration sources parsed with `syn` into a [`crate::model::Snapshot`], plus data file loading

pub mod source;

pub use source::{HostError, SourceFile, build_snapshot, parse_declarations, read_additional_file, read_source};
