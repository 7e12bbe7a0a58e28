//! Structural model of the declarations a generation pass works on.
//!
//! The host builds a [`Snapshot`] once per pass (see [`crate::frontend::source`]) and the generators only ever borrow
//! it. Nothing in this module knows about `syn`: types, expressions and visibilities are kept as source text so the
//! model stays comparable, serializable and cheap to construct in tests.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// 1-based line/column position in a source or data file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Where a declaration, annotation, row or field came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// A span inside a declaration source.
    Source {
        file: Arc<str>,
        start: Position,
        end: Position,
    },
    /// A row (and optionally a 1-based field column) of a data file.
    Row {
        file: Arc<str>,
        line: usize,
        field: Option<usize>,
    },
    /// A data file as a whole.
    File { file: Arc<str> },
}

impl Location {
    pub fn source(file: &Arc<str>, start: Position, end: Position) -> Self {
        Location::Source {
            file: Arc::clone(file),
            start,
            end,
        }
    }

    pub fn row(file: &Arc<str>, line: usize) -> Self {
        Location::Row {
            file: Arc::clone(file),
            line,
            field: None,
        }
    }

    pub fn field(file: &Arc<str>, line: usize, field: usize) -> Self {
        Location::Row {
            file: Arc::clone(file),
            line,
            field: Some(field),
        }
    }

    pub fn whole_file(file: &Arc<str>) -> Self {
        Location::File { file: Arc::clone(file) }
    }

    /// The file this location points into.
    pub fn file(&self) -> &str {
        match self {
            Location::Source { file, .. } | Location::Row { file, .. } | Location::File { file } => file,
        }
    }

    /// The first line covered, if the location is finer than a whole file.
    pub fn line(&self) -> Option<usize> {
        match self {
            Location::Source { start, .. } => Some(start.line),
            Location::Row { line, .. } => Some(*line),
            Location::File { .. } => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Source { file, start, .. } => write!(f, "{}:{}:{}", file, start.line, start.column),
            Location::Row {
                file,
                line,
                field: Some(field),
            } => write!(f, "{}:{} (field {})", file, line, field),
            Location::Row { file, line, field: None } => write!(f, "{}:{}", file, line),
            Location::File { file } => write!(f, "{}", file),
        }
    }
}

/// Visibility of a declaration, kept so generated items can match it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Crate,
    /// `pub(super)`, `pub(in path)`, stored as written.
    Restricted(String),
}

/// Kind of a declaration in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Struct,
    Enum,
    Trait,
    /// An inline module; its members are the foreign functions declared directly inside it.
    Module,
}

/// One argument of an annotation, as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum AnnotationArg {
    /// A type reference (`HGDIOBJ`, `crate::gdi::HGDIOBJ`, `Vec<u8>`).
    Type(String),
    /// A string literal, unquoted.
    Str(String),
    /// An integer literal.
    Int(i64),
    /// An explicitly omitted slot (`_`, `None`).
    Omitted,
    /// `name = value`.
    Named { name: String, value: Box<AnnotationArg> },
    /// Anything else, as source text.
    Expr(String),
    /// An argument list that is valid attribute syntax but not a comma-separated list of arguments.
    Malformed { text: String, reason: String },
}

impl AnnotationArg {
    /// Short description of the argument's kind, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnnotationArg::Type(_) => "type",
            AnnotationArg::Str(_) => "string literal",
            AnnotationArg::Int(_) => "integer literal",
            AnnotationArg::Omitted => "omitted slot",
            AnnotationArg::Named { .. } => "named argument",
            AnnotationArg::Expr(_) => "expression",
            AnnotationArg::Malformed { .. } => "malformed argument list",
        }
    }
}

/// A structured marker attached to a declaration, method or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Annotation {
    /// Last path segment as written (`auto_handle`, `AutoHandleAttribute`).
    pub name: String,
    pub args: Vec<AnnotationArg>,
    pub location: Location,
}

impl Annotation {
    /// Look up a named argument by any of its accepted spellings.
    pub fn named_arg(&self, matches: impl Fn(&str) -> bool) -> Option<&AnnotationArg> {
        self.args.iter().find_map(|a| match a {
            AnnotationArg::Named { name, value } if matches(name) => Some(value.as_ref()),
            _ => None,
        })
    }

    /// Positional (unnamed) arguments in order.
    pub fn positional(&self) -> impl Iterator<Item = &AnnotationArg> {
        self.args.iter().filter(|a| !matches!(a, AnnotationArg::Named { .. }))
    }
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParamMode {
    Value,
    /// `&T`
    In,
    /// `&mut T`
    Ref,
    /// `#[out] &mut T`
    Out,
}

/// A method or foreign-function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Param {
    /// `None` when the pattern is not a plain identifier.
    pub name: Option<String>,
    /// Full declared type.
    pub ty: String,
    /// For `In`/`Ref`/`Out` parameters, the referenced type.
    pub referent: Option<String>,
    pub mode: ParamMode,
    pub annotations: Vec<Annotation>,
}

/// Method receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Receiver {
    Ref,
    RefMut,
    Value,
}

/// A method signature (trait method, inherent method, or foreign function).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Method {
    pub name: String,
    pub docs: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub visibility: Visibility,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    /// Declared return type; `None` for `()`.
    pub ret: Option<String>,
    pub has_generics: bool,
    /// Declared inside an `extern` block.
    pub is_foreign: bool,
    pub location: Location,
}

/// A member of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Member {
    Field { name: String, location: Location },
    Const { name: String, location: Location },
    Method(Method),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field { name, .. } | Member::Const { name, .. } => name,
            Member::Method(m) => &m.name,
        }
    }
}

/// A named declaration with its annotations and members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub visibility: Visibility,
    pub docs: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Fields, consts and methods. For structs this includes members of inherent `impl` blocks in the same source.
    pub members: Vec<Member>,
    pub has_generics: bool,
    /// Enclosing modules, outermost first.
    pub module_path: Vec<String>,
    pub location: Location,
}

impl Declaration {
    /// Fully qualified display name (`test32::IUnkHolder`).
    pub fn qualified_name(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module_path.join("::"), self.name)
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn has_fields(&self) -> bool {
        self.members.iter().any(|m| matches!(m, Member::Field { .. }))
    }
}

/// Read-only view of every declaration visible to one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub declarations: Vec<Declaration>,
}

impl Snapshot {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// External data file supplied to a pass, fully read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdditionalFile {
    pub path: Arc<str>,
    pub text: String,
}

impl AdditionalFile {
    pub fn new(path: impl Into<Arc<str>>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
    }
}
