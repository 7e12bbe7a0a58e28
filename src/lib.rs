#![forbid(unsafe_code)]
//! handlegen: source generators for native handle wrappers and interop adapters
//!
//! One generation pass reads a [`model::Snapshot`] of annotated Rust declarations plus optional handle data files and
//! produces Rust source units and coded diagnostics. Four generators run in a fixed order:
//!
//! - `#[auto_handle(..)]` struct stubs become strongly typed handle wrappers,
//! - `#[auto_safe_handle(..)]` stubs become owning wrappers that release on drop,
//! - rows of `*handles.csv` files become handle wrappers,
//! - status-code methods with an interface out parameter get `Result`-returning adapters.
//!
//! Generated code links against the `handlegen_runtime` crate.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `generators` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Generator input**: Problems in declarations or data files are [`diagnostics::Diagnostic`] values, never panics
//!   and never `Err`.
//!
//! - **True invariants**: If a panic represents a generator bug (logic error), use `.expect("INVARIANT: reason")` with
//!   a clear explanation.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod frontend;
pub mod generators;
pub mod model;
pub mod pipeline;

pub use config::GeneratorConfig;
pub use diagnostics::Diagnostic;
pub use frontend::{HostError, SourceFile};
pub use generators::{GeneratorId, SynthesizedUnit};
pub use pipeline::{Compilation, Driver, PassInput, PassOutput, run_and_update};
