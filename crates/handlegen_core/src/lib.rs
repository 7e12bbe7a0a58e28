//! Provide the canonical vocabulary shared by the handlegen generators and their tooling.
//!
//! This crate is intentionally small and dependency-free. It contains registries that both the generators and the
//! CLI consult instead of scattering string comparisons:
//! - annotation spellings (and the aliases accepted for them),
//! - diagnostic ids and their stable codes,
//! - native interop conventions (status type, marker trait, primitive handle representations).
//!
//! ## Notes
//!
//! - This is a "vocabulary" crate: **no IO**, no global state, and no syntax-tree types.
//! - Diagnostic codes are a public contract: tests and downstream tooling match on them exactly.
//!
//! ## Examples
//! ```rust
//! use handlegen_core::annotations::{self, AnnotationId};
//! use handlegen_core::diagnostics::{self, DiagnosticId};
//!
//! assert_eq!(annotations::from_str("AutoHandleAttribute"), Some(AnnotationId::AutoHandle));
//! assert_eq!(diagnostics::code(DiagnosticId::RowStructure), "HGEN001");
//! ```

pub mod annotations;
pub mod conventions;
pub mod diagnostics;
pub mod registry;
