//! Shared emission helpers: token building blocks and unit rendering.
//!
//! ## Notes
//!
//! - Units are rendered by parsing the generated tokens as a `syn::File`, formatting with `prettyplease`, prepending a
//!   stable header and parsing the final text once more. A unit that reaches the caller is valid Rust by construction.
//! - User-written expressions are carried as [`verbatim`] placeholders and spliced back after formatting, so they
//!   appear exactly as the author wrote them.
//! - Emission is codegen-only: it does not read/write files.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::model::{Location, Visibility};

use super::GeneratorId;

/// Error during unit emission.
#[derive(Debug)]
pub enum EmitError {
    SynParse(String),
    InvalidTypeReference(String),
    /// A verbatim placeholder did not survive formatting exactly once.
    Verbatim(usize),
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::SynParse(msg) => write!(f, "syn parse error: {}", msg),
            EmitError::InvalidTypeReference(text) => write!(f, "invalid type reference: `{}`", text),
            EmitError::Verbatim(index) => write!(f, "verbatim placeholder {} was not emitted exactly once", index),
        }
    }
}

impl std::error::Error for EmitError {}

const VERBATIM_MACRO: &str = "__handlegen_verbatim";

/// Expression placeholder for the `index`-th entry of the `verbatim` list passed to [`render_unit_with`].
pub fn verbatim(index: usize) -> TokenStream {
    let name = format_ident!("{}", VERBATIM_MACRO);
    let index = proc_macro2::Literal::usize_unsuffixed(index);
    quote! { #name!(#index) }
}

/// Render a unit's tokens to final text.
pub fn render_unit(tokens: TokenStream, generator: GeneratorId, origin: &Location) -> Result<String, EmitError> {
    render_unit_with(tokens, generator, origin, &[])
}

/// Render a unit, replacing each [`verbatim`] placeholder with its source text after formatting.
pub fn render_unit_with(
    tokens: TokenStream,
    generator: GeneratorId,
    origin: &Location,
    verbatim: &[&str],
) -> Result<String, EmitError> {
    let file: syn::File = syn::parse2(tokens).map_err(|e| EmitError::SynParse(e.to_string()))?;
    let mut formatted = prettyplease::unparse(&file);
    for (index, source) in verbatim.iter().enumerate() {
        let placeholder = format!("{}!({})", VERBATIM_MACRO, index);
        if formatted.matches(&placeholder).count() != 1 {
            return Err(EmitError::Verbatim(index));
        }
        formatted = formatted.replacen(&placeholder, source, 1);
    }
    let text = format!("{}\n{}", header(generator, origin), formatted);
    syn::parse_file(&text).map_err(|e| EmitError::SynParse(e.to_string()))?;
    Ok(text)
}

/// Stable first lines of every unit.
pub fn header(generator: GeneratorId, origin: &Location) -> String {
    format!(
        "// @generated by handlegen v{} ({}) from {}.\n// Do not edit: changes are overwritten on the next build.\n",
        env!("CARGO_PKG_VERSION"),
        generator,
        origin
    )
}

/// Parse a type reference.
pub fn parse_type(text: &str) -> Result<syn::Type, EmitError> {
    syn::parse_str(text).map_err(|_| EmitError::InvalidTypeReference(text.to_string()))
}

/// Parse a path-shaped type reference (`HGDIOBJ`, `crate::gdi::HGDIOBJ`, `Handle<u8>`).
pub fn parse_type_path(text: &str) -> Result<syn::Path, EmitError> {
    match syn::parse_str::<syn::TypePath>(text) {
        Ok(tp) if tp.qself.is_none() => Ok(tp.path),
        _ => Err(EmitError::InvalidTypeReference(text.to_string())),
    }
}

/// The runtime crate path from the configuration.
pub fn runtime_path(config: &GeneratorConfig) -> Result<syn::Path, EmitError> {
    syn::parse_str(&config.runtime_path).map_err(|_| EmitError::InvalidTypeReference(config.runtime_path.clone()))
}

/// Forwarded `#[doc]` attributes.
pub fn doc_attrs(docs: &[String]) -> TokenStream {
    quote! { #(#[doc = #docs])* }
}

/// Visibility tokens matching the declaration.
pub fn visibility(vis: &Visibility) -> Result<TokenStream, EmitError> {
    Ok(match vis {
        Visibility::Private => TokenStream::new(),
        Visibility::Public => quote! { pub },
        Visibility::Crate => quote! { pub(crate) },
        Visibility::Restricted(text) => {
            let parsed: syn::Visibility = syn::parse_str(text).map_err(|e| EmitError::SynParse(e.to_string()))?;
            quote! { #parsed }
        }
    })
}

/// An identifier, keyword-safe (`r#type` for `type`).
pub fn ident(name: &str) -> Result<syn::Ident, EmitError> {
    if let Ok(ident) = syn::parse_str::<syn::Ident>(name) {
        return Ok(ident);
    }
    syn::parse_str::<syn::Ident>(&format!("r#{}", name)).map_err(|e| EmitError::SynParse(e.to_string()))
}

/// Build the identifier `{base}{suffix}`.
pub fn suffixed(base: &str, suffix: &str) -> syn::Ident {
    format_ident!("{}{}", base, suffix)
}

/// Single-segment primitive name of a path, if it is one.
pub fn primitive_name(path: &syn::Path) -> Option<String> {
    let ident = path.get_ident()?.to_string();
    handlegen_core::conventions::is_primitive_repr(&ident).then_some(ident)
}
