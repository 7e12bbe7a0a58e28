//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use handlegen_core::diagnostics::{DIAGNOSTICS, Severity};
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::diagnostics::{self, Diagnostic};
use crate::frontend::{HostError, build_snapshot, read_additional_file, read_source};
use crate::generators::SynthesizedUnit;
use crate::pipeline::{Driver, PassInput, PassOutput};

use super::{CliError, CliResult, ExitCode, OutputFormat, PassArgs};

// ============================================================================
// Pass preparation (shared between generate and check)
// ============================================================================

/// A completed pass plus the input texts needed to render diagnostics.
struct CompletedPass {
    output: PassOutput,
    /// File path to full text, for source snippets.
    texts: HashMap<String, String>,
}

fn host_error(err: HostError) -> CliError {
    CliError::failure(format!("Error: {}", err))
}

/// Resolve the configuration: file (or defaults), then `--only`.
fn load_config(args: &PassArgs) -> CliResult<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path).map_err(|e| CliError::failure(format!("Error: {}", e)))?,
        None => GeneratorConfig::default(),
    };
    if !args.only.is_empty() {
        config = config.with_generators(args.only.iter().copied());
    }
    config
        .validate()
        .map_err(|e| CliError::failure(format!("Error: invalid configuration: {}", e)))?;
    Ok(config)
}

/// Read every input fully, then run one pass.
fn run_pass(args: &PassArgs) -> CliResult<CompletedPass> {
    let config = load_config(args)?;

    let sources = args
        .sources
        .iter()
        .map(|p| read_source(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(host_error)?;
    let files = args
        .handles
        .iter()
        .map(|p| read_additional_file(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(host_error)?;
    let snapshot = build_snapshot(&sources).map_err(host_error)?;
    tracing::info!(
        sources = sources.len(),
        declarations = snapshot.len(),
        files = files.len(),
        "running generation pass"
    );

    let mut texts = HashMap::new();
    for source in &sources {
        texts.insert(source.path.to_string(), source.text.clone());
    }
    for file in &files {
        texts.insert(file.path.to_string(), file.text.clone());
    }

    let driver = Driver::new(config);
    let output = driver.run(&PassInput { snapshot, files });
    Ok(CompletedPass { output, texts })
}

// ============================================================================
// Reporting
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<&'a [SynthesizedUnit]>,
    diagnostics: &'a [Diagnostic],
}

fn print_json(units: Option<&[SynthesizedUnit]>, diagnostics: &[Diagnostic]) -> CliResult<()> {
    let report = JsonReport { units, diagnostics };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::failure(format!("Error serializing report: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn print_human_diagnostics(pass: &CompletedPass) {
    for diag in &pass.output.diagnostics {
        let source = pass.texts.get(diag.location.file()).map(String::as_str);
        eprintln!("{}", diagnostics::render(diag, source));
    }
    let errors = pass.output.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        eprintln!("handlegen: {} error(s)", errors);
    }
}

fn exit_code_for(output: &PassOutput) -> ExitCode {
    if output.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Commands
// ============================================================================

/// `handlegen generate`
pub fn generate(args: &PassArgs, out_dir: Option<&Path>) -> CliResult<ExitCode> {
    let pass = run_pass(args)?;

    if let Some(dir) = out_dir {
        write_units(dir, &pass.output.units)?;
    }

    match args.format {
        OutputFormat::Json => {
            let units = out_dir.is_none().then_some(pass.output.units.as_slice());
            print_json(units, &pass.output.diagnostics)?;
        }
        OutputFormat::Human => {
            if out_dir.is_none() {
                for unit in &pass.output.units {
                    println!("=== {} ===", unit.name);
                    println!("{}", unit.text);
                }
            }
            print_human_diagnostics(&pass);
        }
    }
    Ok(exit_code_for(&pass.output))
}

/// `handlegen check`
pub fn check(args: &PassArgs) -> CliResult<ExitCode> {
    let pass = run_pass(args)?;
    match args.format {
        OutputFormat::Json => print_json(None, &pass.output.diagnostics)?,
        OutputFormat::Human => {
            print_human_diagnostics(&pass);
            if !pass.output.has_errors() {
                println!("✓ {} unit(s) would be generated", pass.output.units.len());
            }
        }
    }
    Ok(exit_code_for(&pass.output))
}

/// `handlegen codes`
pub fn list_codes() -> CliResult<ExitCode> {
    for entry in DIAGNOSTICS {
        let severity = match entry.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!(
            "{}  {:<7}  {:<28}  {}",
            entry.code, severity, entry.item.canonical, entry.item.description
        );
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Output files
// ============================================================================

/// Validate output directory path to prevent path traversal.
fn validate_output_dir(out_dir: &Path) -> CliResult<()> {
    for component in out_dir.components() {
        if let std::path::Component::ParentDir = component {
            return Err(CliError::failure(format!(
                "Output directory '{}' contains path traversal (..)",
                out_dir.display()
            )));
        }
    }

    // Warn about absolute paths (but allow them for flexibility)
    if out_dir.is_absolute() {
        tracing::warn!(
            "Using absolute output path: {}. Consider using a relative path.",
            out_dir.display()
        );
    }

    Ok(())
}

fn write_units(out_dir: &Path, units: &[SynthesizedUnit]) -> CliResult<()> {
    validate_output_dir(out_dir)?;
    fs::create_dir_all(out_dir).map_err(|e| {
        CliError::failure(format!("Error creating output directory '{}': {}", out_dir.display(), e))
    })?;
    for unit in units {
        let path = out_dir.join(&unit.name);
        fs::write(&path, &unit.text)
            .map_err(|e| CliError::failure(format!("Error writing '{}': {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "wrote unit");
    }
    Ok(())
}
