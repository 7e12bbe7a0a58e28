//! Diagnostics and error reporting for the generators.
//!
//! A [`Diagnostic`] is created once by a validator or synthesizer and never mutated afterwards. Its code comes from
//! the `handlegen_core::diagnostics` registry; the message catalog in [`errors`] keeps wording consistent across
//! generators. Rendering with source snippets goes through `miette`.

use std::fmt;

use handlegen_core::diagnostics::{self as registry, DiagnosticId, Severity};
use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use serde::Serialize;
use serde::ser::Serializer;

use crate::model::{Location, Position};

/// A coded, located report of a problem in generator input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    #[serde(skip)]
    pub id: DiagnosticId,
    pub code: &'static str,
    #[serde(serialize_with = "serialize_severity")]
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(id: DiagnosticId, location: Location, message: impl Into<String>) -> Self {
        let info = registry::info_for(id);
        Self {
            id,
            code: info.code,
            severity: info.severity,
            location,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {} ({})", kind, self.code, self.message, self.location)
    }
}

fn serialize_severity<S: Serializer>(severity: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    })
}

// ============================================================================
// Message catalog
// ============================================================================

/// Build diagnostics with consistent wording.
pub mod errors {
    use super::*;

    // ---- data file, row level -------------------------------------------------

    pub fn missing_row_field(location: Location, field: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::RowStructure,
            location,
            format!("handle row is missing required field `{}`", field),
        )
        .with_note("expected: name, underlying-type, [interface], [base-type], [docs]")
    }

    pub fn too_many_row_fields(location: Location, found: usize, max: usize) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::RowStructure,
            location,
            format!("handle row has {} fields, at most {} are allowed", found, max),
        )
        .with_note("quote the docs field if it contains commas")
    }

    pub fn invalid_identifier(location: Location, text: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidTypeReference,
            location,
            format!("`{}` is not a valid handle name", text),
        )
    }

    pub fn invalid_type_reference(location: Location, role: &str, text: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidTypeReference,
            location,
            format!("{} `{}` is not a valid type reference", role, text),
        )
    }

    // ---- data file, file level ------------------------------------------------

    pub fn duplicate_handle_name(location: Location, name: &str, first_line: usize) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::FileConsistency,
            location,
            format!("handle `{}` is defined more than once", name),
        )
        .with_note(format!("first defined on line {}", first_line))
    }

    pub fn empty_handles_file(location: Location) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::FileConsistency,
            location,
            "handle file contains no handle definitions",
        )
    }

    pub fn misshaped_first_line(location: Location, found: usize, min: usize, max: usize) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::FileConsistency,
            location,
            format!(
                "first handle definition has {} fields, expected between {} and {}",
                found, min, max
            ),
        )
        .with_note("the whole file is skipped until its shape is fixed")
    }

    pub fn unreadable_handles_file(location: Location, detail: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::FileConsistency,
            location,
            format!("handle file could not be read as CSV: {}", detail),
        )
    }

    // ---- annotations ----------------------------------------------------------

    pub fn invalid_annotation_argument(
        location: Location,
        annotation: &str,
        position: usize,
        expected: &str,
        found: &str,
    ) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidAnnotationArgument,
            location,
            format!(
                "argument {} of `#[{}]` must be a {}, found {}",
                position, annotation, expected, found
            ),
        )
    }

    pub fn malformed_annotation_arguments(location: Location, annotation: &str, text: &str, reason: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidAnnotationArgument,
            location,
            format!("arguments of `#[{}]` could not be read: {}", annotation, reason),
        )
        .with_note(format!("found `{}`", text))
    }

    pub fn too_many_annotation_arguments(location: Location, annotation: &str, max: usize, found: usize) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidAnnotationArgument,
            location,
            format!("`#[{}]` takes at most {} arguments, found {}", annotation, max, found),
        )
    }

    pub fn unknown_annotation_argument(location: Location, annotation: &str, name: &str, known: &[&str]) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidAnnotationArgument,
            location,
            format!("`#[{}]` has no argument named `{}`", annotation, name),
        )
        .with_note(format!("known arguments: {}", known.join(", ")))
    }

    pub fn missing_annotation_argument(location: Location, annotation: &str, what: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::MissingAnnotationArgument,
            location,
            format!("`#[{}]` requires {}", annotation, what),
        )
    }

    pub fn invalid_release_expression(location: Location, text: &str, detail: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::InvalidReleaseExpression,
            location,
            format!("release expression `{}` is not a valid expression: {}", text, detail),
        )
        .with_note("the expression is evaluated with `handle` bound to the plain handle value")
    }

    pub fn unsupported_declaration(location: Location, annotation: &str, reason: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::UnsupportedDeclaration,
            location,
            format!("`#[{}]` cannot be applied here: {}", annotation, reason),
        )
    }

    // ---- synthesis ------------------------------------------------------------

    pub fn synthesis_failed(location: Location, name: &str, detail: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::SynthesisFailed,
            location,
            format!("generated code for `{}` is not valid Rust: {}", name, detail),
        )
    }

    pub fn duplicate_unit_name(location: Location, name: &str, first: &Location) -> Diagnostic {
        Diagnostic::new(
            DiagnosticId::SynthesisFailed,
            location,
            format!("generated unit `{}` was already produced in this pass", name),
        )
        .with_note(format!("first produced from {}", first))
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Adapter exposing a [`Diagnostic`] to miette's report handlers.
struct Report<'a> {
    diag: &'a Diagnostic,
    source: Option<NamedSource<String>>,
    span: Option<SourceSpan>,
}

impl fmt::Debug for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report").field("diag", self.diag).finish()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message)
    }
}

impl std::error::Error for Report<'_> {}

impl miette::Diagnostic for Report<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(self.diag.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diag.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        if self.diag.notes.is_empty() {
            None
        } else {
            Some(Box::new(self.diag.notes.join("\n")))
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source.as_ref().map(|s| s as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let label = match &self.diag.location {
            Location::Row { field: Some(field), .. } => format!("field {}", field),
            _ => "here".to_string(),
        };
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(Some(label), span))))
    }
}

/// Render a diagnostic for a terminal, with a source snippet when `source` holds the located file's text.
pub fn render(diag: &Diagnostic, source: Option<&str>) -> String {
    let span = source.and_then(|text| span_for(&diag.location, text));
    let report = Report {
        diag,
        source: source.map(|text| NamedSource::new(diag.location.file(), text.to_string())),
        span,
    };
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = String::new();
    if handler.render_report(&mut out, &report).is_err() {
        // Rendering into a String only fails on a broken Display impl; fall back to the plain form.
        return diag.to_string();
    }
    out
}

/// Byte range of a location inside `source`.
fn span_for(location: &Location, source: &str) -> Option<SourceSpan> {
    match location {
        Location::Source { start, end, .. } => {
            let from = offset_of(source, *start)?;
            let to = offset_of(source, *end).unwrap_or(from).max(from);
            Some(SourceSpan::from(from..to))
        }
        Location::Row { line, .. } => {
            let from = offset_of(source, Position::new(*line, 1))?;
            let len = source[from..].find('\n').unwrap_or(source.len() - from);
            Some(SourceSpan::from(from..from + len.max(1)))
        }
        Location::File { .. } => None,
    }
}

/// Byte offset of a 1-based line / 1-based character column.
fn offset_of(source: &str, pos: Position) -> Option<usize> {
    if pos.line == 0 {
        return None;
    }
    let mut line_start = 0;
    for _ in 1..pos.line {
        line_start += source[line_start..].find('\n')? + 1;
    }
    let line = &source[line_start..];
    let line = &line[..line.find('\n').unwrap_or(line.len())];
    let col = line
        .char_indices()
        .nth(pos.column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    Some(line_start + col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn csv() -> Arc<str> {
        Arc::from("handles.csv")
    }

    #[test]
    fn codes_follow_registry() {
        let d = errors::missing_row_field(Location::field(&csv(), 2, 2), "underlying-type");
        assert_eq!(d.code, "HGEN001");
        assert!(d.is_error());
        let d = errors::duplicate_handle_name(Location::row(&csv(), 5), "HPEN", 1);
        assert_eq!(d.code, "HGEN003");
        assert_eq!(d.notes, vec!["first defined on line 1".to_string()]);
    }

    #[test]
    fn display_includes_code_and_location() {
        let d = errors::invalid_identifier(Location::field(&csv(), 3, 1), "1HPEN");
        assert_eq!(
            d.to_string(),
            "error[HGEN002]: `1HPEN` is not a valid handle name (handles.csv:3 (field 1))"
        );
    }

    #[test]
    fn offsets_are_line_and_char_based() {
        let src = "ab\ncdé\nfg";
        assert_eq!(offset_of(src, Position::new(1, 1)), Some(0));
        assert_eq!(offset_of(src, Position::new(2, 3)), Some(5));
        assert_eq!(offset_of(src, Position::new(3, 2)), Some(10));
        assert_eq!(offset_of(src, Position::new(4, 1)), None);
    }

    #[test]
    fn render_includes_code_and_snippet() {
        let src = "HPEN,isize\nHBRUSH\n";
        let d = errors::missing_row_field(Location::field(&csv(), 2, 2), "underlying-type");
        let out = render(&d, Some(src));
        assert!(out.contains("HGEN001"), "{out}");
        assert!(out.contains("HBRUSH"), "{out}");
    }

    #[test]
    fn render_without_source_still_reports() {
        let d = errors::empty_handles_file(Location::whole_file(&csv()));
        let out = render(&d, None);
        assert!(out.contains("no handle definitions"), "{out}");
    }

    #[test]
    fn serializes_to_json() {
        let d = errors::empty_handles_file(Location::whole_file(&csv()));
        let json = serde_json::to_value(&d).expect("serialize");
        assert_eq!(json["code"], "HGEN003");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["location"]["kind"], "file");
    }
}
