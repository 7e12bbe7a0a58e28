//! Resource-owning safe handles.
//!
//! A safe handle stores a plain handle plus an ownership flag and releases the handle exactly once, on `close` or on
//! drop. The release step is either a user expression evaluated with `handle` bound to the plain value, or the
//! `ReleasePolicy` of a base type. Without either, the runtime's `NoRelease` policy is used.

use handlegen_core::annotations::AnnotationId;
use handlegen_core::conventions;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, errors};
use crate::model::{Annotation, Declaration, Location, Visibility};

use super::annotations::{self, HandleAnnotation};
use super::emit::{self, EmitError};
use super::handle::{check_stub, note_collisions};
use super::{Generator, GeneratorId, GeneratorInput, GeneratorOutput, SynthesizedUnit, scan, unit_name};

/// Inherent members every safe handle receives.
pub const SYNTHESIZED_MEMBERS: &[&str] = &[
    "new",
    "null",
    "is_invalid",
    "handle",
    "into_handle",
    "close",
    "release_handle",
];

/// How a safe handle releases its resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// A user expression, kept as written; `handle` is bound to the plain value.
    Expression(String),
    /// `<Base as ReleasePolicy>::release(raw)`.
    Policy(syn::Path),
    /// The runtime `NoRelease` policy.
    NoRelease,
}

/// A fully resolved safe handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeHandleModel {
    pub ident: syn::Ident,
    pub visibility: Visibility,
    pub docs: Vec<String>,
    pub module_path: Vec<String>,
    pub plain: syn::Path,
    pub release: Release,
    /// Extra conversion target for the raw value.
    pub underlying: Option<syn::Path>,
    pub origin: Location,
}

/// Render a safe handle's items. A release expression is left as the [`emit::verbatim`] placeholder `0`.
pub fn render_safe_handle(model: &SafeHandleModel, config: &GeneratorConfig) -> Result<TokenStream, EmitError> {
    let rt = emit::runtime_path(config)?;
    let handle_trait = format_ident!("{}", conventions::HANDLE_TRAIT);
    let raw_alias = format_ident!("{}", conventions::RAW_HANDLE_ALIAS);
    let field = format_ident!("{}", conventions::HANDLE_FIELD);
    let binding = format_ident!("{}", conventions::RELEASE_BINDING);
    let ident = &model.ident;
    let plain = &model.plain;
    let vis = emit::visibility(&model.visibility)?;
    let docs = emit::doc_attrs(&model.docs);

    let release_body = match &model.release {
        Release::Expression(_) => {
            let outcome = format_ident!("{}", conventions::RELEASE_OUTCOME_TRAIT);
            let expr = emit::verbatim(0);
            quote! {
                let #binding: #plain = self.#field;
                #rt::#outcome::released(#expr)
            }
        }
        Release::Policy(base) => {
            let policy = format_ident!("{}", conventions::RELEASE_POLICY_TRAIT);
            quote! {
                <#base as #rt::#policy>::release(#rt::#handle_trait::raw(&self.#field))
            }
        }
        Release::NoRelease => {
            let policy = format_ident!("{}", conventions::RELEASE_POLICY_TRAIT);
            let no_release = format_ident!("{}", conventions::NO_RELEASE_POLICY);
            quote! {
                <#rt::#no_release as #rt::#policy>::release(#rt::#handle_trait::raw(&self.#field))
            }
        }
    };

    let underlying_impl = model.underlying.as_ref().map(|target| {
        let convert = match emit::primitive_name(target) {
            Some(_) => quote! { #rt::#handle_trait::raw(&h.#field) as #target },
            None => quote! { <#target>::from_raw(#rt::#handle_trait::raw(&h.#field) as _) },
        };
        quote! {
            impl ::core::convert::From<&#ident> for #target {
                fn from(h: &#ident) -> Self {
                    #convert
                }
            }
        }
    });

    Ok(quote! {
        #docs
        #[derive(Debug)]
        #vis struct #ident {
            #field: #plain,
            owns_handle: bool,
        }

        impl #ident {
            /// Wrap `handle`. When `owns_handle` is set the handle is released on `close` or drop.
            pub fn new(#field: #plain, owns_handle: bool) -> Self {
                Self { #field, owns_handle }
            }

            /// A wrapper around the null handle that owns nothing.
            pub fn null() -> Self {
                Self::new(<#plain as ::core::default::Default>::default(), false)
            }

            /// Whether the wrapped handle is null.
            pub fn is_invalid(&self) -> bool {
                #rt::#handle_trait::is_null(&self.#field)
            }

            /// The wrapped plain handle. Ownership stays with `self`.
            pub fn handle(&self) -> #plain {
                self.#field
            }

            /// Give up ownership without releasing.
            pub fn into_handle(self) -> #plain {
                let #field = self.#field;
                ::core::mem::forget(self);
                #field
            }

            /// Release the handle now if owned; returns whether the release succeeded.
            pub fn close(&mut self) -> bool {
                if !self.owns_handle || self.is_invalid() {
                    return true;
                }
                self.owns_handle = false;
                self.release_handle()
            }

            fn release_handle(&self) -> bool {
                #release_body
            }
        }

        impl ::core::ops::Drop for #ident {
            fn drop(&mut self) {
                let _ = self.close();
            }
        }

        impl ::core::default::Default for #ident {
            fn default() -> Self {
                Self::null()
            }
        }

        impl #rt::#handle_trait for #ident {
            fn raw(&self) -> #rt::#raw_alias {
                #rt::#handle_trait::raw(&self.#field)
            }
        }

        impl ::core::convert::From<&#ident> for #plain {
            fn from(h: &#ident) -> Self {
                h.#field
            }
        }

        impl ::core::convert::From<#plain> for #ident {
            /// Wrap without taking ownership.
            fn from(#field: #plain) -> Self {
                Self::new(#field, false)
            }
        }

        #underlying_impl
    })
}

/// Generator for `#[auto_safe_handle(..)]` struct stubs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSafeHandleGenerator;

impl AutoSafeHandleGenerator {
    fn validate(decl: &Declaration, ann: &Annotation) -> Result<SafeHandleModel, Diagnostic> {
        check_stub(decl, AnnotationId::AutoSafeHandle)?;
        let HandleAnnotation::AutoSafeHandle {
            release,
            plain,
            base,
            underlying,
        } = annotations::parse_auto_safe_handle(ann)?
        else {
            return Err(errors::unsupported_declaration(
                ann.location.clone(),
                &ann.name,
                "annotation family mismatch",
            ));
        };
        note_collisions(decl, SYNTHESIZED_MEMBERS);

        let release = match (release, base) {
            (Some(expr), base) => {
                if let Some(base) = base {
                    tracing::debug!(
                        decl = %decl.qualified_name(),
                        base = %base.text,
                        "release expression given; base release policy is not used"
                    );
                }
                Release::Expression(expr.text)
            }
            (None, Some(base)) => Release::Policy(base.path),
            (None, None) => Release::NoRelease,
        };
        let ident = emit::ident(&decl.name)
            .map_err(|e| errors::synthesis_failed(decl.location.clone(), &decl.name, &e.to_string()))?;

        Ok(SafeHandleModel {
            ident,
            visibility: decl.visibility.clone(),
            docs: decl.docs.clone(),
            module_path: decl.module_path.clone(),
            plain: plain.path,
            release,
            underlying: underlying.map(|u| u.path),
            origin: decl.location.clone(),
        })
    }

    fn synthesize(model: &SafeHandleModel, config: &GeneratorConfig) -> Result<SynthesizedUnit, EmitError> {
        let tokens = render_safe_handle(model, config)?;
        let verbatim: Vec<&str> = match &model.release {
            Release::Expression(text) => vec![text.as_str()],
            _ => Vec::new(),
        };
        let text = emit::render_unit_with(tokens, GeneratorId::AutoSafeHandle, &model.origin, &verbatim)?;
        Ok(SynthesizedUnit {
            name: unit_name(&model.module_path, &model.ident.to_string(), GeneratorId::AutoSafeHandle),
            generator: GeneratorId::AutoSafeHandle,
            origin: model.origin.clone(),
            module_path: model.module_path.clone(),
            text,
        })
    }
}

impl Generator for AutoSafeHandleGenerator {
    fn id(&self) -> GeneratorId {
        GeneratorId::AutoSafeHandle
    }

    #[tracing::instrument(skip_all, name = "auto_safe_handle")]
    fn generate(&self, input: &GeneratorInput<'_>) -> GeneratorOutput {
        let mut out = GeneratorOutput::default();
        for (decl, ann) in scan::annotated(input.snapshot, AnnotationId::AutoSafeHandle) {
            let result = Self::validate(decl, ann).and_then(|model| {
                Self::synthesize(&model, input.config)
                    .map_err(|e| errors::synthesis_failed(decl.location.clone(), &decl.name, &e.to_string()))
            });
            match result {
                Ok(unit) => out.push_unit(unit),
                Err(diagnostic) => {
                    tracing::debug!(decl = %decl.qualified_name(), code = diagnostic.code, "rejected");
                    out.push_diagnostic(diagnostic);
                }
            }
        }
        out
    }
}
