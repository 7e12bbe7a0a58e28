//! Candidate discovery.
//!
//! Scanning never fails and never reports: it only decides what each generator looks at. Order follows the snapshot
//! (or the supplied file list), which keeps every pass deterministic.

use handlegen_core::annotations::{self, AnnotationId};

use crate::model::{AdditionalFile, Annotation, DeclKind, Declaration, Method, Snapshot};

/// Declarations carrying annotation `id`, paired with its first occurrence.
pub fn annotated(snapshot: &Snapshot, id: AnnotationId) -> impl Iterator<Item = (&Declaration, &Annotation)> {
    snapshot.iter().filter_map(move |decl| {
        let mut found = decl
            .annotations
            .iter()
            .filter(|a| annotations::from_str(&a.name) == Some(id));
        let first = found.next()?;
        if found.next().is_some() {
            tracing::debug!(
                decl = %decl.qualified_name(),
                annotation = annotations::as_str(id),
                "annotation repeated; only the first occurrence is used"
            );
        }
        Some((decl, first))
    })
}

/// Whether a member carries annotation `id`.
pub fn has_annotation(list: &[Annotation], id: AnnotationId) -> bool {
    list.iter().any(|a| annotations::from_str(&a.name) == Some(id))
}

/// First occurrence of annotation `id` in a list.
pub fn find_annotation(list: &[Annotation], id: AnnotationId) -> Option<&Annotation> {
    list.iter().find(|a| annotations::from_str(&a.name) == Some(id))
}

/// Traits and inline modules that declare at least one method.
pub fn method_holders(snapshot: &Snapshot) -> impl Iterator<Item = (&Declaration, Vec<&Method>)> {
    snapshot
        .iter()
        .filter(|decl| matches!(decl.kind, DeclKind::Trait | DeclKind::Module))
        .filter_map(|decl| {
            let methods: Vec<&Method> = decl
                .methods()
                .filter(|m| decl.kind == DeclKind::Trait || m.is_foreign)
                .collect();
            (!methods.is_empty()).then_some((decl, methods))
        })
}

/// Supplied data files whose name ends with `suffix` (ASCII case-insensitive).
pub fn handle_files<'a>(files: &'a [AdditionalFile], suffix: &'a str) -> impl Iterator<Item = &'a AdditionalFile> {
    let suffix = suffix.to_ascii_lowercase();
    files
        .iter()
        .filter(move |f| f.file_name().to_ascii_lowercase().ends_with(&suffix))
}
