//! Handle wrappers from CSV data files.
//!
//! Each row is `name, underlying-type, [interface], [base-type], [docs]`. There is no header row; blank lines and
//! `#` comment lines are skipped, fields are trimmed and double quotes allow commas inside docs.
//!
//! Validation runs in three stages per file:
//! 1. whole-file shape (non-empty, first row has 2..=5 fields); a failure aborts the file,
//! 2. uniqueness of names; each repeat is reported and skipped,
//! 3. each remaining row on its own; a bad row never stops later rows.
//!
//! So a file-consistency diagnostic always precedes any row-level one for the same file.

use std::collections::HashMap;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::diagnostics::{Diagnostic, errors};
use crate::model::{AdditionalFile, Location, Visibility};

use super::annotations::TypeRef;
use super::emit;
use super::handle::{self, HandleModel, HandleSpec};
use super::{Generator, GeneratorId, GeneratorInput, GeneratorOutput, scan};

/// Fewest fields a row may have (name, underlying type).
pub const MIN_FIELDS: usize = 2;
/// Most fields a row may have (name, underlying, interface, base, docs).
pub const MAX_FIELDS: usize = 5;

const FIELD_NAMES: [&str; MAX_FIELDS] = ["name", "underlying-type", "interface", "base-type", "docs"];

/// One validated row of a handle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleRow {
    /// 1-based line in the file.
    pub line: usize,
    pub name: String,
    pub underlying: TypeRef,
    pub interface: Option<TypeRef>,
    pub base: Option<TypeRef>,
    pub docs: Option<String>,
}

/// Result of checking one file: valid rows plus diagnostics in report order.
#[derive(Debug, Clone, Default)]
pub struct CheckedFile {
    pub rows: Vec<HandleRow>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Read and validate every row of a handle file.
pub fn check_file(file: &AdditionalFile) -> CheckedFile {
    let mut checked = CheckedFile::default();
    let records = match read_records(file) {
        Ok(records) => records,
        Err(diagnostic) => {
            checked.diagnostics.push(diagnostic);
            return checked;
        }
    };

    // Stage 1: whole-file shape.
    let Some((first_line, first)) = records.first() else {
        checked
            .diagnostics
            .push(errors::empty_handles_file(Location::whole_file(&file.path)));
        return checked;
    };
    if !(MIN_FIELDS..=MAX_FIELDS).contains(&first.len()) {
        checked.diagnostics.push(errors::misshaped_first_line(
            Location::row(&file.path, *first_line),
            first.len(),
            MIN_FIELDS,
            MAX_FIELDS,
        ));
        return checked;
    }

    // Stage 2: uniqueness.
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut skip = vec![false; records.len()];
    for (i, (line, record)) in records.iter().enumerate() {
        let name = record.get(0).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        match first_seen.get(name) {
            Some(first) => {
                checked.diagnostics.push(errors::duplicate_handle_name(
                    Location::field(&file.path, *line, 1),
                    name,
                    *first,
                ));
                skip[i] = true;
            }
            None => {
                first_seen.insert(name, *line);
            }
        }
    }

    // Stage 3: rows.
    for (i, (line, record)) in records.iter().enumerate() {
        if skip[i] {
            continue;
        }
        match check_row(&file.path, *line, record) {
            Ok(row) => checked.rows.push(row),
            Err(diagnostic) => checked.diagnostics.push(diagnostic),
        }
    }
    checked
}

fn read_records(file: &AdditionalFile) -> Result<Vec<(usize, StringRecord)>, Diagnostic> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(file.text.as_bytes());
    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            let location = match e.position() {
                Some(pos) => Location::row(&file.path, pos.line() as usize),
                None => Location::whole_file(&file.path),
            };
            errors::unreadable_handles_file(location, &e.to_string())
        })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(index + 1);
        records.push((line, record));
    }
    Ok(records)
}

/// Validate one record. The first problem found is reported.
pub fn check_row(path: &Arc<str>, line: usize, record: &StringRecord) -> Result<HandleRow, Diagnostic> {
    if record.len() > MAX_FIELDS {
        return Err(errors::too_many_row_fields(
            Location::row(path, line),
            record.len(),
            MAX_FIELDS,
        ));
    }
    let field = |i: usize| record.get(i).filter(|f| !f.is_empty());

    let Some(name) = field(0) else {
        return Err(errors::missing_row_field(Location::field(path, line, 1), FIELD_NAMES[0]));
    };
    let Some(underlying) = field(1) else {
        return Err(errors::missing_row_field(Location::field(path, line, 2), FIELD_NAMES[1]));
    };
    if syn::parse_str::<syn::Ident>(name).is_err() {
        return Err(errors::invalid_identifier(Location::field(path, line, 1), name));
    }
    let type_field = |i: usize, text: &str| -> Result<TypeRef, Diagnostic> {
        emit::parse_type_path(text)
            .map(|parsed| TypeRef {
                text: text.to_string(),
                path: parsed,
            })
            .map_err(|_| errors::invalid_type_reference(Location::field(path, line, i + 1), FIELD_NAMES[i], text))
    };
    let underlying = type_field(1, underlying)?;
    let interface = field(2).map(|t| type_field(2, t)).transpose()?;
    let base = field(3).map(|t| type_field(3, t)).transpose()?;

    Ok(HandleRow {
        line,
        name: name.to_string(),
        underlying,
        interface,
        base,
        docs: field(4).map(str::to_string),
    })
}

/// Generator for rows of `*handles.csv` data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlesFileGenerator;

impl Generator for HandlesFileGenerator {
    fn id(&self) -> GeneratorId {
        GeneratorId::HandlesFile
    }

    #[tracing::instrument(skip_all, name = "handles_file")]
    fn generate(&self, input: &GeneratorInput<'_>) -> GeneratorOutput {
        let mut out = GeneratorOutput::default();
        for file in scan::handle_files(input.files, &input.config.handles_file_suffix) {
            let checked = check_file(file);
            tracing::debug!(
                file = %file.path,
                rows = checked.rows.len(),
                diagnostics = checked.diagnostics.len(),
                "checked handle file"
            );
            out.diagnostics.extend(checked.diagnostics);
            let prefix = vec![file.stem().to_string()];
            for row in &checked.rows {
                let origin = Location::row(&file.path, row.line);
                let spec = HandleSpec {
                    name: &row.name,
                    visibility: Visibility::Public,
                    docs: row.docs.iter().map(|d| format!(" {}", d)).collect(),
                    module_path: Vec::new(),
                    interface: row.interface.as_ref(),
                    underlying: Some(&row.underlying),
                    base: row.base.as_ref(),
                    origin: origin.clone(),
                };
                let unit = HandleModel::resolve(spec, input.config)
                    .and_then(|model| handle::synthesize(&model, &prefix, self.id(), input.config));
                match unit {
                    Ok(unit) => out.push_unit(unit),
                    Err(e) => out.push_diagnostic(errors::synthesis_failed(origin, &row.name, &e.to_string())),
                }
            }
        }
        out
    }
}
