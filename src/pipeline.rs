//! Pass driver: runs the enabled generators over one input and aggregates their output.
//!
//! ## Notes
//!
//! - Generators run in [`GeneratorId::ALL`] order and each sees the same read-only input, so a pass is a pure
//!   function of its [`PassInput`] and configuration.
//! - Unit names are unique per pass. A later unit that reuses a name is dropped and reported (`HGEN008`).
//! - [`run_and_update`] mirrors a host that merges generated units back into its compilation.

use std::collections::HashMap;
use std::fmt;

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, errors};
use crate::frontend::{HostError, SourceFile, build_snapshot};
use crate::generators::{Generator, GeneratorId, GeneratorInput, GeneratorOutput, SynthesizedUnit, generator_for};
use crate::model::{AdditionalFile, Location, Snapshot};

/// Everything one pass consumes.
#[derive(Debug, Clone, Default)]
pub struct PassInput {
    pub snapshot: Snapshot,
    pub files: Vec<AdditionalFile>,
}

/// Units and diagnostics of one pass, in generator order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutput {
    pub units: Vec<SynthesizedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PassOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Runs a fixed set of generators.
pub struct Driver {
    config: GeneratorConfig,
    generators: Vec<Box<dyn Generator>>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<GeneratorId> = self.generators.iter().map(|g| g.id()).collect();
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("generators", &ids)
            .finish()
    }
}

impl Driver {
    /// A driver running every generator the configuration enables.
    pub fn new(config: GeneratorConfig) -> Self {
        let generators = GeneratorId::ALL
            .into_iter()
            .filter(|id| config.is_enabled(*id))
            .map(generator_for)
            .collect();
        Self { config, generators }
    }

    /// A driver running exactly `ids`, in [`GeneratorId::ALL`] order.
    pub fn with_generators(config: GeneratorConfig, ids: &[GeneratorId]) -> Self {
        let generators = GeneratorId::ALL
            .into_iter()
            .filter(|id| ids.contains(id))
            .map(generator_for)
            .collect();
        Self { config, generators }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generator_ids(&self) -> Vec<GeneratorId> {
        self.generators.iter().map(|g| g.id()).collect()
    }

    /// Run one pass.
    #[tracing::instrument(skip_all, fields(declarations = input.snapshot.len(), files = input.files.len()))]
    pub fn run(&self, input: &PassInput) -> PassOutput {
        let generator_input = GeneratorInput {
            snapshot: &input.snapshot,
            files: &input.files,
            config: &self.config,
        };
        let mut output = PassOutput::default();
        let mut produced: HashMap<String, Location> = HashMap::new();
        for generator in &self.generators {
            let GeneratorOutput { units, diagnostics } = generator.generate(&generator_input);
            tracing::debug!(
                generator = %generator.id(),
                units = units.len(),
                diagnostics = diagnostics.len(),
                "generator finished"
            );
            output.diagnostics.extend(diagnostics);
            for unit in units {
                if let Some(first) = produced.get(&unit.name) {
                    output
                        .diagnostics
                        .push(errors::duplicate_unit_name(unit.origin.clone(), &unit.name, first));
                    continue;
                }
                produced.insert(unit.name.clone(), unit.origin.clone());
                output.units.push(unit);
            }
        }
        tracing::debug!(units = output.units.len(), diagnostics = output.diagnostics.len(), "pass finished");
        output
    }
}

/// Source trees of a compilation: hand-written sources plus generated units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    pub sources: Vec<SourceFile>,
    pub generated: Vec<SynthesizedUnit>,
}

impl Compilation {
    pub fn new(sources: Vec<SourceFile>) -> Self {
        Self {
            sources,
            generated: Vec::new(),
        }
    }

    /// Number of syntax trees: sources plus generated units.
    pub fn tree_count(&self) -> usize {
        self.sources.len() + self.generated.len()
    }
}

/// Run a pass over a compilation's sources and return it with the generated units added.
///
/// Units from an earlier update are replaced, not accumulated.
pub fn run_and_update(
    driver: &Driver,
    compilation: &Compilation,
    files: &[AdditionalFile],
) -> Result<(Compilation, Vec<Diagnostic>), HostError> {
    let snapshot = build_snapshot(&compilation.sources)?;
    let output = driver.run(&PassInput {
        snapshot,
        files: files.to_vec(),
    });
    let updated = Compilation {
        sources: compilation.sources.clone(),
        generated: output.units,
    };
    Ok((updated, output.diagnostics))
}
