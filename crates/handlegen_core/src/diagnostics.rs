//! Diagnostic id registry.
//!
//! Codes are a stable contract: once published, a code keeps its meaning. Two distinct file-wide violations (a
//! duplicate handle name and a malformed overall file shape) deliberately share [`DiagnosticId::FileConsistency`].

use crate::registry::{ItemInfo, Stability};

/// Namespace prefix shared by every diagnostic code.
pub const CODE_PREFIX: &str = "HGEN";

/// Stable identifier for diagnostics emitted by the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticId {
    /// A data-file row is missing a required field or carries too many fields.
    RowStructure,
    /// A name or type field is not a plausible identifier/type path.
    InvalidTypeReference,
    /// A file-wide rule is violated (duplicate name, empty file, misshaped defining line).
    FileConsistency,
    /// An annotation argument has the wrong kind (e.g. an expression where a type is expected).
    InvalidAnnotationArgument,
    /// A required annotation argument is absent.
    MissingAnnotationArgument,
    /// A release expression does not parse as an expression.
    InvalidReleaseExpression,
    /// An annotation is attached to a declaration shape the generator cannot handle.
    UnsupportedDeclaration,
    /// Rendering a validated model did not yield a parsable unit.
    SynthesisFailed,
}

/// Severity of a diagnostic. Every diagnostic in the current catalog is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// Metadata entry for a diagnostic: registry info plus its code and default severity.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticInfo {
    pub item: ItemInfo<DiagnosticId>,
    pub code: &'static str,
    pub severity: Severity,
}

/// Registry of diagnostics, ordered by code.
pub const DIAGNOSTICS: &[DiagnosticInfo] = &[
    info(
        DiagnosticId::RowStructure,
        "HGEN001",
        "row-structure",
        "A handle row is missing a required field or has too many fields.",
    ),
    info(
        DiagnosticId::InvalidTypeReference,
        "HGEN002",
        "invalid-type-reference",
        "A handle name or type field is not a valid identifier or type path.",
    ),
    info(
        DiagnosticId::FileConsistency,
        "HGEN003",
        "file-consistency",
        "The handle file violates a file-wide rule: duplicate name, empty file, or misshaped first line.",
    ),
    info(
        DiagnosticId::InvalidAnnotationArgument,
        "HGEN004",
        "invalid-annotation-argument",
        "An annotation argument has the wrong kind or there are too many arguments.",
    ),
    info(
        DiagnosticId::MissingAnnotationArgument,
        "HGEN005",
        "missing-annotation-argument",
        "A required annotation argument is missing.",
    ),
    info(
        DiagnosticId::InvalidReleaseExpression,
        "HGEN006",
        "invalid-release-expression",
        "A safe-handle release expression is not a valid expression.",
    ),
    info(
        DiagnosticId::UnsupportedDeclaration,
        "HGEN007",
        "unsupported-declaration",
        "The annotation is attached to a declaration the generator cannot extend.",
    ),
    info(
        DiagnosticId::SynthesisFailed,
        "HGEN008",
        "synthesis-failed",
        "Generated code for a validated declaration failed to parse.",
    ),
];

/// Return the metadata entry for a diagnostic.
pub fn info_for(id: DiagnosticId) -> &'static DiagnosticInfo {
    DIAGNOSTICS
        .iter()
        .find(|d| d.item.id == id)
        .expect("INVARIANT: every DiagnosticId has a registry entry")
}

/// Return the stable code (`HGEN00x`) for a diagnostic.
pub fn code(id: DiagnosticId) -> &'static str {
    info_for(id).code
}

/// Return the kebab-case slug for a diagnostic.
pub fn slug(id: DiagnosticId) -> &'static str {
    info_for(id).item.canonical
}

/// Resolve a code or slug to its stable id.
pub fn from_str(name: &str) -> Option<DiagnosticId> {
    DIAGNOSTICS
        .iter()
        .find(|d| d.code == name || d.item.matches(name))
        .map(|d| d.item.id)
}

const fn info(id: DiagnosticId, code: &'static str, slug: &'static str, description: &'static str) -> DiagnosticInfo {
    DiagnosticInfo {
        item: ItemInfo {
            id,
            canonical: slug,
            aliases: &[],
            description,
            since_version: Some("0.1.0"),
            stability: Stability::Stable,
        },
        code,
        severity: Severity::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn file_structure_codes_are_pinned() {
        assert_eq!(code(DiagnosticId::RowStructure), "HGEN001");
        assert_eq!(code(DiagnosticId::InvalidTypeReference), "HGEN002");
        assert_eq!(code(DiagnosticId::FileConsistency), "HGEN003");
    }

    #[test]
    fn codes_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for d in DIAGNOSTICS {
            assert!(d.code.starts_with(CODE_PREFIX), "{} lacks prefix", d.code);
            assert!(seen.insert(d.code), "duplicate code {}", d.code);
        }
    }

    #[test]
    fn every_entry_is_an_error() {
        assert!(DIAGNOSTICS.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn from_str_accepts_code_and_slug() {
        assert_eq!(from_str("HGEN006"), Some(DiagnosticId::InvalidReleaseExpression));
        assert_eq!(from_str("file-consistency"), Some(DiagnosticId::FileConsistency));
        assert_eq!(from_str("HGEN999"), None);
    }
}
