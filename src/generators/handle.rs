//! Native handle wrappers.
//!
//! A handle wrapper is a `#[repr(transparent)]` newtype over a primitive integer. It gets construction and null
//! checks, conversions to and from the raw value, the runtime `IHandle` implementation, an optional interface marker
//! implementation and two-way conversions with its parent handles.
//!
//! [`HandleModel`] is shared with the data-file generator, which builds the same model from a row.

use handlegen_core::annotations::AnnotationId;
use handlegen_core::conventions;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, errors};
use crate::model::{DeclKind, Declaration, Location, Visibility};

use super::annotations::{self, HandleAnnotation, TypeRef};
use super::emit::{self, EmitError};
use super::{Generator, GeneratorId, GeneratorInput, GeneratorOutput, SynthesizedUnit, scan, unit_name};

/// Inherent members every wrapper receives.
pub const SYNTHESIZED_MEMBERS: &[&str] = &["NULL", "from_raw", "as_raw", "is_null"];

/// A fully resolved handle wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleModel {
    pub ident: syn::Ident,
    pub visibility: Visibility,
    pub docs: Vec<String>,
    pub module_path: Vec<String>,
    /// Interface marker trait; `None` means only the runtime `IHandle`.
    pub interface: Option<syn::Path>,
    /// Stored primitive representation.
    pub repr: syn::Ident,
    /// Handles this one converts to and from.
    pub parents: Vec<syn::Path>,
    pub origin: Location,
}

/// Raw inputs of a handle wrapper, before classification.
#[derive(Debug, Clone)]
pub struct HandleSpec<'a> {
    pub name: &'a str,
    pub visibility: Visibility,
    pub docs: Vec<String>,
    pub module_path: Vec<String>,
    pub interface: Option<&'a TypeRef>,
    pub underlying: Option<&'a TypeRef>,
    pub base: Option<&'a TypeRef>,
    pub origin: Location,
}

impl HandleModel {
    /// Resolve defaults and classify the underlying type.
    ///
    /// A primitive integer `underlying` sets the representation; any other type becomes a parent handle. A `base`
    /// always becomes a parent. The interface defaults to the runtime `IHandle`, which needs no marker impl.
    pub fn resolve(spec: HandleSpec<'_>, config: &GeneratorConfig) -> Result<HandleModel, EmitError> {
        let ident = emit::ident(spec.name)?;
        let mut repr = emit::ident(&config.raw_type)?;
        let mut parents: Vec<syn::Path> = Vec::new();

        if let Some(underlying) = spec.underlying {
            match emit::primitive_name(&underlying.path) {
                Some(prim) => repr = emit::ident(&prim)?,
                None => parents.push(underlying.path.clone()),
            }
        }
        if let Some(base) = spec.base {
            if emit::primitive_name(&base.path).is_none() && !parents.contains(&base.path) {
                parents.push(base.path.clone());
            }
        }
        parents.retain(|p| !p.is_ident(&ident));

        let interface = spec
            .interface
            .map(|i| i.path.clone())
            .filter(|p| !is_handle_trait(p));

        Ok(HandleModel {
            ident,
            visibility: spec.visibility,
            docs: spec.docs,
            module_path: spec.module_path,
            interface,
            repr,
            parents,
            origin: spec.origin,
        })
    }
}

fn is_handle_trait(path: &syn::Path) -> bool {
    path.segments
        .last()
        .is_some_and(|s| s.ident == conventions::HANDLE_TRAIT && s.arguments.is_empty())
}

/// Render a handle wrapper's items.
pub fn render_handle(model: &HandleModel, config: &GeneratorConfig) -> Result<TokenStream, EmitError> {
    let rt = emit::runtime_path(config)?;
    let raw_alias = format_ident!("{}", conventions::RAW_HANDLE_ALIAS);
    let handle_trait = format_ident!("{}", conventions::HANDLE_TRAIT);
    let field = format_ident!("{}", conventions::HANDLE_FIELD);
    let ident = &model.ident;
    let repr = &model.repr;
    let vis = emit::visibility(&model.visibility)?;
    let docs = emit::doc_attrs(&model.docs);

    let interface_impl = model.interface.as_ref().map(|iface| {
        quote! {
            impl #iface for #ident {}
        }
    });

    let parent_impls = model.parents.iter().map(|parent| {
        quote! {
            impl ::core::convert::From<#ident> for #parent {
                fn from(h: #ident) -> Self {
                    <#parent>::from_raw(#rt::#handle_trait::raw(&h) as _)
                }
            }

            impl ::core::convert::From<#parent> for #ident {
                fn from(h: #parent) -> Self {
                    #ident::from_raw(#rt::#handle_trait::raw(&h) as _)
                }
            }
        }
    });

    Ok(quote! {
        #docs
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #vis struct #ident {
            #field: #repr,
        }

        impl #ident {
            /// The null handle.
            pub const NULL: #ident = #ident { #field: 0 };

            /// Wrap a raw handle value.
            pub const fn from_raw(#field: #repr) -> Self {
                Self { #field }
            }

            /// The raw handle value.
            pub const fn as_raw(self) -> #repr {
                self.#field
            }

            /// Whether this is the null handle.
            pub const fn is_null(self) -> bool {
                self.#field == 0
            }
        }

        impl ::core::convert::From<#repr> for #ident {
            fn from(#field: #repr) -> Self {
                Self::from_raw(#field)
            }
        }

        impl ::core::convert::From<#ident> for #repr {
            fn from(h: #ident) -> Self {
                h.#field
            }
        }

        impl ::core::cmp::PartialEq<#repr> for #ident {
            fn eq(&self, other: &#repr) -> bool {
                self.#field == *other
            }
        }

        impl #rt::#handle_trait for #ident {
            fn raw(&self) -> #rt::#raw_alias {
                self.#field as #rt::#raw_alias
            }
        }

        #interface_impl

        #(#parent_impls)*
    })
}

/// Render a model into a complete unit.
pub fn synthesize(
    model: &HandleModel,
    name_prefix: &[String],
    generator: GeneratorId,
    config: &GeneratorConfig,
) -> Result<SynthesizedUnit, EmitError> {
    let tokens = render_handle(model, config)?;
    let text = emit::render_unit(tokens, generator, &model.origin)?;
    Ok(SynthesizedUnit {
        name: unit_name(name_prefix, &model.ident.to_string(), generator),
        generator,
        origin: model.origin.clone(),
        module_path: model.module_path.clone(),
        text,
    })
}

/// Check that an annotated declaration is a stub the generator can complete.
pub(crate) fn check_stub(decl: &Declaration, annotation: AnnotationId) -> Result<(), Diagnostic> {
    let name = handlegen_core::annotations::as_str(annotation);
    let reason = if decl.kind != DeclKind::Struct {
        Some("only structs can be completed")
    } else if decl.has_generics {
        Some("the struct must not be generic")
    } else if decl.has_fields() {
        Some("the struct must be a unit or empty struct; the generated part declares the fields")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(errors::unsupported_declaration(decl.location.clone(), name, reason)),
        None => Ok(()),
    }
}

/// Log hand-written members that collide with synthesized ones; the compiler reports the conflict.
pub(crate) fn note_collisions(decl: &Declaration, synthesized: &[&str]) {
    for member in &decl.members {
        if synthesized.contains(&member.name()) {
            tracing::debug!(
                decl = %decl.qualified_name(),
                member = member.name(),
                "hand-written member collides with a generated one"
            );
        }
    }
}

/// Generator for `#[auto_handle(..)]` struct stubs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoHandleGenerator;

impl AutoHandleGenerator {
    fn validate(decl: &Declaration, ann: &crate::model::Annotation, config: &GeneratorConfig) -> Result<HandleModel, Diagnostic> {
        check_stub(decl, AnnotationId::AutoHandle)?;
        let HandleAnnotation::AutoHandle { interface, underlying } = annotations::parse_auto_handle(ann)? else {
            return Err(errors::unsupported_declaration(
                ann.location.clone(),
                &ann.name,
                "annotation family mismatch",
            ));
        };
        note_collisions(decl, SYNTHESIZED_MEMBERS);
        let spec = HandleSpec {
            name: &decl.name,
            visibility: decl.visibility.clone(),
            docs: decl.docs.clone(),
            module_path: decl.module_path.clone(),
            interface: interface.as_ref(),
            underlying: underlying.as_ref(),
            base: None,
            origin: decl.location.clone(),
        };
        HandleModel::resolve(spec, config)
            .map_err(|e| errors::synthesis_failed(decl.location.clone(), &decl.name, &e.to_string()))
    }
}

impl Generator for AutoHandleGenerator {
    fn id(&self) -> GeneratorId {
        GeneratorId::AutoHandle
    }

    #[tracing::instrument(skip_all, name = "auto_handle")]
    fn generate(&self, input: &GeneratorInput<'_>) -> GeneratorOutput {
        let mut out = GeneratorOutput::default();
        for (decl, ann) in scan::annotated(input.snapshot, AnnotationId::AutoHandle) {
            let model = match Self::validate(decl, ann, input.config) {
                Ok(model) => model,
                Err(diagnostic) => {
                    tracing::debug!(decl = %decl.qualified_name(), code = diagnostic.code, "rejected");
                    out.push_diagnostic(diagnostic);
                    continue;
                }
            };
            match synthesize(&model, &decl.module_path, self.id(), input.config) {
                Ok(unit) => {
                    tracing::trace!(unit = %unit.name, "synthesized");
                    out.push_unit(unit);
                }
                Err(e) => out.push_diagnostic(errors::synthesis_failed(
                    decl.location.clone(),
                    &decl.name,
                    &e.to_string(),
                )),
            }
        }
        out
    }
}
