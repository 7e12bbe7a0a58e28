//! CLI module for handlegen
//!
//! This module provides the command-line host that reads declaration sources and handle files, runs one pass and
//! writes or prints the generated units.
//!
//! ## Commands
//!
//! - `generate <SOURCES>...` - Run a pass and write units to `--out-dir` (or print them)
//! - `check <SOURCES>...` - Run a pass and report diagnostics only
//! - `codes` - Print the diagnostic code catalog
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::generators::GeneratorId;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an error with a custom exit code.
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Source generators for native handle wrappers and interop adapters
#[derive(Parser, Debug)]
#[command(name = "handlegen")]
#[command(version = VERSION)]
#[command(about = "Source generators for native handle wrappers and interop adapters", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// How diagnostics (and, for `generate`, units) are printed.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Rendered reports with source snippets
    #[default]
    Human,
    /// One JSON document on stdout
    Json,
}

/// Inputs shared by `generate` and `check`.
#[derive(Args, Debug, Clone)]
pub struct PassArgs {
    /// Rust declaration sources
    #[arg(value_name = "SOURCES", required = true)]
    pub sources: Vec<PathBuf>,

    /// Handle data file (repeatable); consumed when its name ends with the configured suffix
    #[arg(long = "handles", value_name = "FILE")]
    pub handles: Vec<PathBuf>,

    /// Generator configuration (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Run only these generators (repeatable)
    #[arg(long = "only", value_name = "GENERATOR")]
    pub only: Vec<GeneratorId>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a generation pass
    Generate {
        #[command(flatten)]
        pass: PassArgs,
        /// Write units into this directory instead of printing them
        #[arg(long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Run a generation pass and report diagnostics only
    Check {
        #[command(flatten)]
        pass: PassArgs,
    },

    /// Print the diagnostic code catalog
    Codes,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Generate { pass, out_dir } => commands::generate(&pass, out_dir.as_deref()),
        Command::Check { pass } => commands::check(&pass),
        Command::Codes => commands::list_codes(),
    }
}

// ============================================================================
// Tests
// ============================================================================
