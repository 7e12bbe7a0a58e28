//! Generators: discovery, validation and synthesis for each annotation family
//!
//! Every generator follows the same shape: [`scan`] enumerates candidates, a family-specific validator turns a
//! candidate into an immutable model or a [`Diagnostic`], and a fixed template renders the model through [`emit`].
//!
//! ## Generators
//!
//! - [`handle::AutoHandleGenerator`] - `#[auto_handle(..)]` struct stubs
//! - [`safe_handle::AutoSafeHandleGenerator`] - `#[auto_safe_handle(..)]` struct stubs
//! - [`handles_file::HandlesFileGenerator`] - rows of `*handles.csv` data files
//! - [`interop::InteropGenerator`] - status-code methods with an interface out parameter
//!
//! ## Notes
//!
//! - Generators are pure: the same [`GeneratorInput`] always yields the same [`GeneratorOutput`].
//! - Ineligible candidates are skipped silently; malformed ones produce a diagnostic and are skipped.

#![deny(clippy::unwrap_used)]

pub mod annotations;
pub mod emit;
pub mod handle;
pub mod handles_file;
pub mod interop;
pub mod safe_handle;
pub mod scan;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostic;
use crate::model::{AdditionalFile, Location, Snapshot};

/// Stable identifier for a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorId {
    AutoHandle,
    AutoSafeHandle,
    HandlesFile,
    Interop,
}

impl GeneratorId {
    /// Every generator, in the order the driver runs them.
    pub const ALL: [GeneratorId; 4] = [
        GeneratorId::AutoHandle,
        GeneratorId::AutoSafeHandle,
        GeneratorId::HandlesFile,
        GeneratorId::Interop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorId::AutoHandle => "auto_handle",
            GeneratorId::AutoSafeHandle => "auto_safe_handle",
            GeneratorId::HandlesFile => "handles_file",
            GeneratorId::Interop => "interop",
        }
    }

    /// Suffix of the unit names this generator produces.
    pub fn unit_suffix(self) -> &'static str {
        match self {
            GeneratorId::AutoHandle | GeneratorId::HandlesFile => "handle.g.rs",
            GeneratorId::AutoSafeHandle => "safe_handle.g.rs",
            GeneratorId::Interop => "interop.g.rs",
        }
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeneratorId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = GeneratorId::ALL.iter().map(|id| id.as_str()).collect();
                format!("unknown generator `{}` (expected one of: {})", s, known.join(", "))
            })
    }
}

/// A generated source artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SynthesizedUnit {
    /// Stable, unique name (`test32.HPEN.handle.g.rs`).
    pub name: String,
    pub generator: GeneratorId,
    /// Declaration or data-file row the unit was generated from.
    pub origin: Location,
    /// Module the unit is meant to be `include!`d into, outermost first.
    pub module_path: Vec<String>,
    pub text: String,
}

/// Build a unit name from a prefix (module path or file stem) and the declaration or row name.
///
/// Identifiers are kept exactly as written. Names that differ only in case or underscores are distinct items, so
/// they must give distinct units.
pub fn unit_name(prefix: &[String], name: &str, generator: GeneratorId) -> String {
    let mut parts: Vec<String> = prefix.iter().filter(|p| !p.is_empty()).cloned().collect();
    if !name.is_empty() {
        parts.push(name.to_string());
    }
    parts.push(generator.unit_suffix().to_string());
    parts.join(".")
}

/// Everything a generator may look at during one pass.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInput<'a> {
    pub snapshot: &'a Snapshot,
    pub files: &'a [AdditionalFile],
    pub config: &'a GeneratorConfig,
}

/// Units and diagnostics produced by one generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOutput {
    pub units: Vec<SynthesizedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratorOutput {
    pub fn push_unit(&mut self, unit: SynthesizedUnit) {
        self.units.push(unit);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: GeneratorOutput) {
        self.units.extend(other.units);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// One fixed transformation from declarations or data files to units.
pub trait Generator {
    fn id(&self) -> GeneratorId;

    fn generate(&self, input: &GeneratorInput<'_>) -> GeneratorOutput;
}

/// Construct a generator by id.
pub fn generator_for(id: GeneratorId) -> Box<dyn Generator> {
    match id {
        GeneratorId::AutoHandle => Box::new(handle::AutoHandleGenerator),
        GeneratorId::AutoSafeHandle => Box::new(safe_handle::AutoSafeHandleGenerator),
        GeneratorId::HandlesFile => Box::new(handles_file::HandlesFileGenerator),
        GeneratorId::Interop => Box::new(interop::InteropGenerator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_names() {
        let module = vec!["test32".to_string()];
        assert_eq!(unit_name(&module, "HPEN", GeneratorId::AutoHandle), "test32.HPEN.handle.g.rs");
        assert_eq!(
            unit_name(&[], "SafeHTEST", GeneratorId::AutoSafeHandle),
            "SafeHTEST.safe_handle.g.rs"
        );
        assert_eq!(unit_name(&module, "", GeneratorId::Interop), "test32.interop.g.rs");
        assert_eq!(unit_name(&[], "Test32", GeneratorId::Interop), "Test32.interop.g.rs");
    }

    #[test]
    fn names_differing_in_case_or_underscores_stay_distinct() {
        let stem = vec!["handles".to_string()];
        let pen = unit_name(&stem, "HPen", GeneratorId::HandlesFile);
        let upper = unit_name(&stem, "H_PEN", GeneratorId::HandlesFile);
        assert_eq!(pen, "handles.HPen.handle.g.rs");
        assert_eq!(upper, "handles.H_PEN.handle.g.rs");
        assert_ne!(pen, upper);
    }

    #[test]
    fn ids_round_trip_through_strings() {
        for id in GeneratorId::ALL {
            assert_eq!(id.as_str().parse::<GeneratorId>(), Ok(id));
            assert_eq!(generator_for(id).id(), id);
        }
        assert!("autohandle".parse::<GeneratorId>().is_err());
    }
}
