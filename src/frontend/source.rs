//! Parse Rust declaration sources into a [`Snapshot`].
//!
//! A declaration source is ordinary Rust syntax: struct stubs carrying `#[auto_handle(..)]` or
//! `#[auto_safe_handle(..)]`, traits and inline modules with `extern` blocks whose methods carry `#[preserve_sig]`,
//! `#[marshal_as(..)]` and `#[out]`. Only the shapes the generators look at are recorded; everything else is skipped.
//!
//! ## Notes
//!
//! - Only attributes known to `handlegen_core::annotations` become [`Annotation`]s. `#[doc]` becomes documentation;
//!   any other attribute (`derive`, `repr`, `link`, ...) is ignored.
//! - Members of inherent `impl` blocks are attached to the struct or enum of the same name in the same module.
//! - Foreign functions are recorded as members of the inline module that contains their `extern` block.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use handlegen_core::{annotations, conventions};
use proc_macro2::{Delimiter, Span, TokenStream, TokenTree};
use quote::ToTokens;
use syn::parse::discouraged::Speculative;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, FnArg, Lit, Meta, Pat, ReturnType, Signature, Token, Type};
use thiserror::Error;

use crate::model::{
    AdditionalFile, Annotation, AnnotationArg, DeclKind, Declaration, Location, Member, Method, Param, ParamMode,
    Position, Receiver, Snapshot, Visibility,
};

/// Error raised by the host before a pass can run.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },
}

/// A declaration source: path plus full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: Arc<str>,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<Arc<str>>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Read a declaration source from disk.
pub fn read_source(path: &Path) -> Result<SourceFile, HostError> {
    let text = read_text(path)?;
    Ok(SourceFile::new(path.display().to_string(), text))
}

/// Read a data file from disk, fully, before the pass starts.
pub fn read_additional_file(path: &Path) -> Result<AdditionalFile, HostError> {
    let text = read_text(path)?;
    Ok(AdditionalFile::new(path.display().to_string(), text))
}

fn read_text(path: &Path) -> Result<String, HostError> {
    std::fs::read_to_string(path).map_err(|source| HostError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Build one snapshot from several sources, in the order given.
pub fn build_snapshot(files: &[SourceFile]) -> Result<Snapshot, HostError> {
    let mut declarations = Vec::new();
    for file in files {
        declarations.extend(parse_declarations(file)?);
    }
    Ok(Snapshot::new(declarations))
}

/// Parse one declaration source.
pub fn parse_declarations(file: &SourceFile) -> Result<Vec<Declaration>, HostError> {
    let ast = syn::parse_file(&file.text).map_err(|e| parse_error(&file.path, &e))?;
    let mut collector = Collector::new(&file.path);
    collector.items(&ast.items)?;
    Ok(collector.finish())
}

fn parse_error(path: &str, err: &syn::Error) -> HostError {
    let start = err.span().start();
    HostError::Parse {
        path: path.to_string(),
        line: start.line,
        column: start.column + 1,
        message: err.to_string(),
    }
}

// ============================================================================
// Declaration collection
// ============================================================================

struct Collector {
    file: Arc<str>,
    module_path: Vec<String>,
    declarations: Vec<Declaration>,
    /// Inherent impl members keyed by (module path, self type name).
    impl_members: HashMap<(Vec<String>, String), Vec<Member>>,
}

impl Collector {
    fn new(file: &Arc<str>) -> Self {
        Self {
            file: Arc::clone(file),
            module_path: Vec::new(),
            declarations: Vec::new(),
            impl_members: HashMap::new(),
        }
    }

    fn finish(mut self) -> Vec<Declaration> {
        for decl in &mut self.declarations {
            if !matches!(decl.kind, DeclKind::Struct | DeclKind::Enum) {
                continue;
            }
            let key = (decl.module_path.clone(), decl.name.clone());
            if let Some(members) = self.impl_members.remove(&key) {
                decl.members.extend(members);
            }
        }
        self.declarations
    }

    fn location(&self, span: Span) -> Location {
        let start = span.start();
        let end = span.end();
        Location::source(
            &self.file,
            Position::new(start.line, start.column + 1),
            Position::new(end.line, end.column + 1),
        )
    }

    fn items(&mut self, items: &[syn::Item]) -> Result<(), HostError> {
        for item in items {
            self.item(item)?;
        }
        Ok(())
    }

    fn item(&mut self, item: &syn::Item) -> Result<(), HostError> {
        match item {
            syn::Item::Struct(s) => {
                let members = match &s.fields {
                    syn::Fields::Named(named) => named
                        .named
                        .iter()
                        .filter_map(|f| f.ident.as_ref().map(|ident| (ident.to_string(), f.span())))
                        .map(|(name, span)| Member::Field {
                            name,
                            location: self.location(span),
                        })
                        .collect(),
                    syn::Fields::Unnamed(unnamed) => unnamed
                        .unnamed
                        .iter()
                        .enumerate()
                        .map(|(i, f)| Member::Field {
                            name: i.to_string(),
                            location: self.location(f.span()),
                        })
                        .collect(),
                    syn::Fields::Unit => Vec::new(),
                };
                let decl = self.declaration(
                    &s.ident,
                    DeclKind::Struct,
                    &s.vis,
                    &s.attrs,
                    members,
                    !s.generics.params.is_empty(),
                )?;
                self.declarations.push(decl);
            }
            syn::Item::Enum(e) => {
                let decl = self.declaration(
                    &e.ident,
                    DeclKind::Enum,
                    &e.vis,
                    &e.attrs,
                    Vec::new(),
                    !e.generics.params.is_empty(),
                )?;
                self.declarations.push(decl);
            }
            syn::Item::Trait(t) => {
                let visibility = visibility(&t.vis);
                let mut members = Vec::new();
                for trait_item in &t.items {
                    match trait_item {
                        syn::TraitItem::Fn(f) => {
                            members.push(Member::Method(self.method(&f.attrs, visibility.clone(), &f.sig, false)?));
                        }
                        syn::TraitItem::Const(c) => members.push(Member::Const {
                            name: c.ident.to_string(),
                            location: self.location(c.ident.span()),
                        }),
                        _ => {}
                    }
                }
                let decl = self.declaration(
                    &t.ident,
                    DeclKind::Trait,
                    &t.vis,
                    &t.attrs,
                    members,
                    !t.generics.params.is_empty(),
                )?;
                self.declarations.push(decl);
            }
            syn::Item::Impl(imp) if imp.trait_.is_none() => {
                let Some(self_name) = type_name(&imp.self_ty) else {
                    return Ok(());
                };
                let mut members = Vec::new();
                for impl_item in &imp.items {
                    match impl_item {
                        syn::ImplItem::Fn(f) => {
                            members.push(Member::Method(self.method(&f.attrs, visibility(&f.vis), &f.sig, false)?));
                        }
                        syn::ImplItem::Const(c) => members.push(Member::Const {
                            name: c.ident.to_string(),
                            location: self.location(c.ident.span()),
                        }),
                        _ => {}
                    }
                }
                self.impl_members
                    .entry((self.module_path.clone(), self_name))
                    .or_default()
                    .extend(members);
            }
            syn::Item::Mod(m) => {
                let Some((_, content)) = &m.content else {
                    return Ok(());
                };
                let mut members = Vec::new();
                for inner in content {
                    if let syn::Item::ForeignMod(foreign) = inner {
                        for foreign_item in &foreign.items {
                            if let syn::ForeignItem::Fn(f) = foreign_item {
                                members.push(Member::Method(self.method(&f.attrs, visibility(&f.vis), &f.sig, true)?));
                            }
                        }
                    }
                }
                let decl = self.declaration(&m.ident, DeclKind::Module, &m.vis, &m.attrs, members, false)?;
                self.declarations.push(decl);

                self.module_path.push(m.ident.to_string());
                let result = self.items(content);
                self.module_path.pop();
                result?;
            }
            _ => {}
        }
        Ok(())
    }

    fn declaration(
        &self,
        ident: &syn::Ident,
        kind: DeclKind,
        vis: &syn::Visibility,
        attrs: &[Attribute],
        members: Vec<Member>,
        has_generics: bool,
    ) -> Result<Declaration, HostError> {
        Ok(Declaration {
            name: ident.to_string(),
            kind,
            visibility: visibility(vis),
            docs: docs(attrs),
            annotations: self.annotations(attrs),
            members,
            has_generics,
            module_path: self.module_path.clone(),
            location: self.location(ident.span()),
        })
    }

    fn method(
        &self,
        attrs: &[Attribute],
        visibility: Visibility,
        sig: &Signature,
        is_foreign: bool,
    ) -> Result<Method, HostError> {
        let mut receiver = None;
        let mut params = Vec::new();
        for input in &sig.inputs {
            match input {
                FnArg::Receiver(r) => {
                    receiver = Some(match (&r.reference, &r.mutability) {
                        (Some(_), Some(_)) => Receiver::RefMut,
                        (Some(_), None) => Receiver::Ref,
                        (None, _) => Receiver::Value,
                    });
                }
                FnArg::Typed(pt) => params.push(self.param(pt)?),
            }
        }
        let ret = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => Some(compact(ty.to_token_stream())),
        };
        Ok(Method {
            name: sig.ident.to_string(),
            docs: docs(attrs),
            annotations: self.annotations(attrs),
            visibility,
            receiver,
            params,
            ret,
            has_generics: !sig.generics.params.is_empty(),
            is_foreign,
            location: self.location(sig.ident.span()),
        })
    }

    fn param(&self, pt: &syn::PatType) -> Result<Param, HostError> {
        let annotations = self.annotations(&pt.attrs);
        let is_out = annotations
            .iter()
            .any(|a| annotations::from_str(&a.name) == Some(annotations::AnnotationId::Out));
        let name = match pt.pat.as_ref() {
            Pat::Ident(pi) if pi.subpat.is_none() => Some(pi.ident.to_string()),
            _ => None,
        };
        let (mode, referent) = match pt.ty.as_ref() {
            Type::Reference(r) if r.mutability.is_some() => {
                let mode = if is_out { ParamMode::Out } else { ParamMode::Ref };
                (mode, Some(compact(r.elem.to_token_stream())))
            }
            Type::Reference(r) => (ParamMode::In, Some(compact(r.elem.to_token_stream()))),
            _ => (ParamMode::Value, None),
        };
        Ok(Param {
            name,
            ty: compact(pt.ty.to_token_stream()),
            referent,
            mode,
            annotations,
        })
    }

    /// Known annotations on an item. Argument lists that do not parse are kept as [`AnnotationArg::Malformed`] so
    /// the generator that owns the annotation can report them against this one candidate.
    fn annotations(&self, attrs: &[Attribute]) -> Vec<Annotation> {
        let mut out = Vec::new();
        for attr in attrs {
            let Some(last) = attr.path().segments.last() else {
                continue;
            };
            let name = last.ident.to_string();
            if annotations::from_str(&name).is_none() {
                continue;
            }
            let args = match &attr.meta {
                Meta::Path(_) => Vec::new(),
                Meta::List(list) => match attr.parse_args_with(Punctuated::<ArgSyntax, Token![,]>::parse_terminated) {
                    Ok(args) => args.into_iter().map(|a| a.0).collect(),
                    Err(e) => vec![AnnotationArg::Malformed {
                        text: compact(list.tokens.clone()),
                        reason: e.to_string(),
                    }],
                },
                Meta::NameValue(nv) => vec![AnnotationArg::Malformed {
                    text: compact(nv.value.to_token_stream()),
                    reason: format!("`#[{} = ..]` is not supported; use `#[{}(..)]`", name, name),
                }],
            };
            out.push(Annotation {
                name,
                args,
                location: self.location(attr.span()),
            });
        }
        out
    }
}

fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(r) if r.in_token.is_none() && r.path.is_ident("crate") => Visibility::Crate,
        syn::Visibility::Restricted(_) => Visibility::Restricted(compact(vis.to_token_stream())),
        syn::Visibility::Inherited => Visibility::Private,
    }
}

fn docs(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

// ============================================================================
// Annotation arguments
// ============================================================================

/// One annotation argument: `"text"`, `42`, `_`, `None`, `name = value`, a type, or an expression.
struct ArgSyntax(AnnotationArg);

impl Parse for ArgSyntax {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(syn::LitStr) {
            let lit: syn::LitStr = input.parse()?;
            return Ok(ArgSyntax(AnnotationArg::Str(lit.value())));
        }
        if input.peek(syn::LitInt) {
            let lit: syn::LitInt = input.parse()?;
            return Ok(ArgSyntax(AnnotationArg::Int(lit.base10_parse::<i64>()?)));
        }
        if input.peek(Token![_]) {
            input.parse::<Token![_]>()?;
            return Ok(ArgSyntax(AnnotationArg::Omitted));
        }
        if input.peek(syn::Ident) && input.peek2(Token![=]) {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let ArgSyntax(value) = input.parse()?;
            return Ok(ArgSyntax(AnnotationArg::Named {
                name: name.to_string(),
                value: Box::new(value),
            }));
        }
        if input.peek(syn::Ident) {
            let fork = input.fork();
            let ident: syn::Ident = fork.parse()?;
            if conventions::is_omitted_spelling(&ident.to_string()) && at_arg_end(&fork) {
                input.advance_to(&fork);
                return Ok(ArgSyntax(AnnotationArg::Omitted));
            }
        }
        let fork = input.fork();
        if let Ok(ty) = fork.parse::<Type>() {
            if at_arg_end(&fork) {
                input.advance_to(&fork);
                return Ok(ArgSyntax(AnnotationArg::Type(compact(ty.to_token_stream()))));
            }
        }
        let expr: Expr = input.parse()?;
        Ok(ArgSyntax(AnnotationArg::Expr(compact(expr.to_token_stream()))))
    }
}

fn at_arg_end(input: ParseStream) -> bool {
    input.is_empty() || input.peek(Token![,])
}

/// Render tokens as compact source text: spaces only between adjacent words.
pub(crate) fn compact(tokens: TokenStream) -> String {
    let mut out = String::new();
    let mut prev_word = false;
    write_compact(&mut out, tokens, &mut prev_word);
    out
}

fn write_compact(out: &mut String, tokens: TokenStream, prev_word: &mut bool) {
    for tt in tokens {
        match tt {
            TokenTree::Ident(ident) => {
                if *prev_word {
                    out.push(' ');
                }
                out.push_str(&ident.to_string());
                *prev_word = true;
            }
            TokenTree::Literal(lit) => {
                if *prev_word {
                    out.push(' ');
                }
                out.push_str(&lit.to_string());
                *prev_word = true;
            }
            TokenTree::Punct(p) => {
                out.push(p.as_char());
                if p.as_char() == ',' {
                    out.push(' ');
                }
                *prev_word = false;
            }
            TokenTree::Group(g) => {
                let (open, close) = match g.delimiter() {
                    Delimiter::Parenthesis => ("(", ")"),
                    Delimiter::Bracket => ("[", "]"),
                    Delimiter::Brace => ("{", "}"),
                    Delimiter::None => ("", ""),
                };
                out.push_str(open);
                let mut inner_prev = false;
                write_compact(out, g.stream(), &mut inner_prev);
                out.push_str(close);
                *prev_word = false;
            }
        }
    }
}
