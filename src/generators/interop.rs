//! Interop method adapters.
//!
//! A native status-code method such as
//!
//! ```text
//! #[preserve_sig]
//! fn GetObj(&self, p1: Option<&IUnknown>, p2: &Guid,
//!           #[marshal_as(IUnknown, iid_param = 1)] #[out] p3: &mut Option<IUnknown>) -> HRESULT;
//! ```
//!
//! gets an adapted twin `get_obj_as::<T>(&self, p1) -> Result<T, HRESULT>` that supplies `T`'s interface id, owns
//! the out slot, maps a failing status to `Err` and converts the out value to `T`.
//!
//! Trait methods are adapted into an extension trait with a blanket impl. Foreign functions in an inline module
//! become `unsafe` free functions in the same module. Methods that do not fit the pattern are skipped without a
//! diagnostic.

use handlegen_core::annotations::{self as vocab, AnnotationId};
use handlegen_core::conventions;
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::diagnostics::errors;
use crate::model::{AnnotationArg, DeclKind, Declaration, Location, Method, Param, ParamMode, Receiver, Visibility};

use super::emit::{self, EmitError};
use super::{Generator, GeneratorId, GeneratorInput, GeneratorOutput, SynthesizedUnit, scan, unit_name};

/// Where adapted methods are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderKind {
    Trait,
    Module,
}

/// How one original argument is supplied by the adapted method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// Forwarded from the adapted method's own parameter.
    Keep { ident: syn::Ident, ty: syn::Type },
    /// The interface id of `T`, by reference or by value.
    Iid { by_ref: bool },
    /// The out slot, owned by the adapted method.
    Result { ident: syn::Ident, inner: syn::Type },
}

/// One adaptable method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedMethod {
    pub target: syn::Ident,
    pub adapted: syn::Ident,
    pub docs: Vec<String>,
    pub visibility: Visibility,
    pub receiver: Option<Receiver>,
    pub args: Vec<CallArg>,
    pub status: syn::Type,
}

/// A holder with at least one adaptable method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterModel {
    pub kind: HolderKind,
    pub holder: syn::Ident,
    pub visibility: Visibility,
    /// Module the unit is included into.
    pub module_path: Vec<String>,
    pub origin: Location,
    pub methods: Vec<AdaptedMethod>,
}

/// Why a method was not adapted. Never reported, only traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Suppressed,
    NotStatusReturn,
    NotPreserveSig,
    Generic,
    Receiver,
    PatternParam,
    NoInterfaceOut,
    BadIidParam,
    UnparsableType,
}

/// Decide whether `method` is adaptable and resolve how to call it.
pub fn adapt(method: &Method, kind: HolderKind, config: &GeneratorConfig) -> Result<AdaptedMethod, Skip> {
    if scan::has_annotation(&method.annotations, AnnotationId::SuppressAutoGen) {
        return Err(Skip::Suppressed);
    }
    let status_text = method.ret.as_deref().ok_or(Skip::NotStatusReturn)?;
    let status = emit::parse_type(status_text).map_err(|_| Skip::UnparsableType)?;
    if !is_status_type(&status, &config.status_type) {
        return Err(Skip::NotStatusReturn);
    }
    match kind {
        HolderKind::Trait if !scan::has_annotation(&method.annotations, AnnotationId::PreserveSig) => {
            return Err(Skip::NotPreserveSig);
        }
        HolderKind::Module if !method.is_foreign => return Err(Skip::NotPreserveSig),
        _ => {}
    }
    if method.has_generics {
        return Err(Skip::Generic);
    }
    match (kind, method.receiver) {
        (HolderKind::Trait, Some(Receiver::Ref | Receiver::RefMut)) | (HolderKind::Module, None) => {}
        _ => return Err(Skip::Receiver),
    }
    if method.params.iter().any(|p| p.name.is_none()) {
        return Err(Skip::PatternParam);
    }

    let (result_index, iid_index) = method
        .params
        .iter()
        .enumerate()
        .find_map(|(i, p)| interface_out(p).map(|iid| (i, iid)))
        .ok_or(Skip::NoInterfaceOut)?;
    let iid_param = method.params.get(iid_index).ok_or(Skip::BadIidParam)?;
    if iid_index == result_index || !matches!(iid_param.mode, ParamMode::In | ParamMode::Value) {
        return Err(Skip::BadIidParam);
    }

    let mut args = Vec::with_capacity(method.params.len());
    for (i, param) in method.params.iter().enumerate() {
        let name = param.name.as_deref().ok_or(Skip::PatternParam)?;
        let ident = emit::ident(name).map_err(|_| Skip::PatternParam)?;
        let arg = if i == result_index {
            let inner_text = param.referent.as_deref().ok_or(Skip::NoInterfaceOut)?;
            CallArg::Result {
                ident,
                inner: emit::parse_type(inner_text).map_err(|_| Skip::UnparsableType)?,
            }
        } else if i == iid_index {
            CallArg::Iid {
                by_ref: param.mode == ParamMode::In,
            }
        } else {
            CallArg::Keep {
                ident,
                ty: emit::parse_type(&param.ty).map_err(|_| Skip::UnparsableType)?,
            }
        };
        args.push(arg);
    }

    let target = emit::ident(&method.name).map_err(|_| Skip::UnparsableType)?;
    let adapted = emit::ident(&format!("{}{}", method.name.to_snake_case(), config.adapted_suffix))
        .map_err(|_| Skip::UnparsableType)?;
    Ok(AdaptedMethod {
        target,
        adapted,
        docs: method.docs.clone(),
        visibility: method.visibility.clone(),
        receiver: method.receiver,
        args,
        status,
    })
}

fn is_status_type(ty: &syn::Type, status: &str) -> bool {
    match ty {
        syn::Type::Path(tp) if tp.qself.is_none() => tp.path.segments.last().is_some_and(|s| s.ident == status),
        _ => false,
    }
}

/// The iid parameter index of an `#[out]` parameter marshaled as an interface, if `param` is one.
fn interface_out(param: &Param) -> Option<usize> {
    if param.mode != ParamMode::Out {
        return None;
    }
    let hint = scan::find_annotation(&param.annotations, AnnotationId::MarshalAs)?;
    let kind = match hint.positional().next()? {
        AnnotationArg::Type(text) | AnnotationArg::Expr(text) => vocab::marshal_kind(text)?,
        _ => return None,
    };
    if !kind.is_interface_like() {
        return None;
    }
    match hint.named_arg(vocab::is_iid_param_arg)? {
        AnnotationArg::Int(n) => usize::try_from(*n).ok(),
        _ => None,
    }
}

/// Collect the adaptable methods of a holder declaration.
pub fn model_for(decl: &Declaration, methods: &[&Method], config: &GeneratorConfig) -> Option<AdapterModel> {
    let kind = match decl.kind {
        DeclKind::Trait => HolderKind::Trait,
        DeclKind::Module => HolderKind::Module,
        _ => return None,
    };
    if kind == HolderKind::Trait && decl.has_generics {
        tracing::trace!(holder = %decl.qualified_name(), "generic trait; skipped");
        return None;
    }
    let adapted: Vec<AdaptedMethod> = methods
        .iter()
        .filter_map(|m| match adapt(m, kind, config) {
            Ok(adapted) => Some(adapted),
            Err(reason) => {
                tracing::trace!(holder = %decl.qualified_name(), method = %m.name, ?reason, "not adapted");
                None
            }
        })
        .collect();
    if adapted.is_empty() {
        return None;
    }
    let holder = emit::ident(&decl.name).ok()?;
    let module_path = match kind {
        HolderKind::Trait => decl.module_path.clone(),
        HolderKind::Module => {
            let mut path = decl.module_path.clone();
            path.push(decl.name.clone());
            path
        }
    };
    Some(AdapterModel {
        kind,
        holder,
        visibility: decl.visibility.clone(),
        module_path,
        origin: decl.location.clone(),
        methods: adapted,
    })
}

// ============================================================================
// Rendering
// ============================================================================

struct Parts {
    params: Vec<TokenStream>,
    call_args: Vec<TokenStream>,
    result_ident: syn::Ident,
    inner: syn::Type,
}

fn parts(method: &AdaptedMethod, rt: &syn::Path, interface: &syn::Ident, t: &syn::Ident) -> Result<Parts, EmitError> {
    let mut params = Vec::new();
    let mut call_args = Vec::new();
    let mut result = None;
    for arg in &method.args {
        match arg {
            CallArg::Keep { ident, ty } => {
                params.push(quote! { #ident: #ty });
                call_args.push(quote! { #ident });
            }
            CallArg::Iid { by_ref: true } => call_args.push(quote! { &<#t as #rt::#interface>::IID }),
            CallArg::Iid { by_ref: false } => call_args.push(quote! { <#t as #rt::#interface>::IID }),
            CallArg::Result { ident, inner } => {
                call_args.push(quote! { &mut #ident });
                result = Some((ident.clone(), inner.clone()));
            }
        }
    }
    let (result_ident, inner) =
        result.ok_or_else(|| EmitError::SynParse(format!("`{}` has no out parameter", method.target)))?;
    Ok(Parts {
        params,
        call_args,
        result_ident,
        inner,
    })
}

/// Render the adapters of one holder.
pub fn render_adapters(model: &AdapterModel, config: &GeneratorConfig) -> Result<TokenStream, EmitError> {
    let rt = emit::runtime_path(config)?;
    let interface = format_ident!("{}", conventions::INTERFACE_TRAIT);
    let status_trait = format_ident!("{}", conventions::STATUS_TRAIT);
    let t = format_ident!("{}", conventions::ADAPTED_TYPE_PARAM);
    let holder = &model.holder;

    let mut items = Vec::new();
    for method in &model.methods {
        let Parts {
            params,
            call_args,
            result_ident,
            inner,
        } = parts(method, &rt, &interface, &t)?;
        let adapted = &method.adapted;
        let target = &method.target;
        let status = &method.status;
        let docs = emit::doc_attrs(&method.docs);
        let signature = quote! {
            #adapted<#t>(#(#params),*) -> ::core::result::Result<#t, #status>
            where
                #t: #rt::#interface + ::core::convert::TryFrom<#inner>
        };

        items.push(match model.kind {
            HolderKind::Trait => {
                let receiver = match method.receiver {
                    Some(Receiver::RefMut) => quote! { &mut self },
                    _ => quote! { &self },
                };
                let note = format!(
                    " Adapted from [`{}::{}`]: supplies the interface id of `{}` and returns the out value as `{}`.",
                    holder, target, t, t
                );
                let signature = insert_receiver(signature, receiver, params.is_empty());
                quote! {
                    #docs
                    #[doc = #note]
                    fn #signature {
                        let mut #result_ident: #inner = ::core::default::Default::default();
                        #rt::#status_trait::into_result(self.#target(#(#call_args),*))?;
                        #rt::cast::<_, #t, #status>(#result_ident)
                    }
                }
            }
            HolderKind::Module => {
                let vis = emit::visibility(&method.visibility)?;
                let note = format!(" Adapted from [`{}`]: returns the out value as `{}`.", target, t);
                let safety = format!(" Same contract as the foreign function [`{}`].", target);
                quote! {
                    #docs
                    #[doc = #note]
                    ///
                    /// # Safety
                    ///
                    #[doc = #safety]
                    #vis unsafe fn #signature {
                        let mut #result_ident: #inner = ::core::default::Default::default();
                        #rt::#status_trait::into_result(unsafe { #target(#(#call_args),*) })?;
                        #rt::cast::<_, #t, #status>(#result_ident)
                    }
                }
            }
        });
    }

    Ok(match model.kind {
        HolderKind::Trait => {
            let ext = emit::suffixed(&holder.to_string(), &config.extension_trait_suffix);
            let vis = emit::visibility(&model.visibility)?;
            let doc = format!(
                " `Result`-returning adapters for the status-code methods of [`{}`].",
                holder
            );
            quote! {
                #[doc = #doc]
                #vis trait #ext: #holder {
                    #(#items)*
                }

                impl<H: #holder + ?Sized> #ext for H {}
            }
        }
        HolderKind::Module => quote! { #(#items)* },
    })
}

/// Splice the receiver in front of the parameter list of a rendered signature.
fn insert_receiver(signature: TokenStream, receiver: TokenStream, no_params: bool) -> TokenStream {
    let mut out = TokenStream::new();
    let mut done = false;
    for tt in signature {
        match tt {
            proc_macro2::TokenTree::Group(g) if !done && g.delimiter() == proc_macro2::Delimiter::Parenthesis => {
                let inner = g.stream();
                let stream = if no_params {
                    receiver.clone()
                } else {
                    quote! { #receiver, #inner }
                };
                let mut group = proc_macro2::Group::new(proc_macro2::Delimiter::Parenthesis, stream);
                group.set_span(g.span());
                out.extend([proc_macro2::TokenTree::Group(group)]);
                done = true;
            }
            other => out.extend([other]),
        }
    }
    out
}

/// Generator for status-code methods with an interface out parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteropGenerator;

impl InteropGenerator {
    fn synthesize(model: &AdapterModel, config: &GeneratorConfig) -> Result<SynthesizedUnit, EmitError> {
        let tokens = render_adapters(model, config)?;
        let text = emit::render_unit(tokens, GeneratorId::Interop, &model.origin)?;
        let name = match model.kind {
            HolderKind::Trait => unit_name(&model.module_path, &model.holder.to_string(), GeneratorId::Interop),
            HolderKind::Module => unit_name(&model.module_path, "", GeneratorId::Interop),
        };
        Ok(SynthesizedUnit {
            name,
            generator: GeneratorId::Interop,
            origin: model.origin.clone(),
            module_path: model.module_path.clone(),
            text,
        })
    }
}

impl Generator for InteropGenerator {
    fn id(&self) -> GeneratorId {
        GeneratorId::Interop
    }

    #[tracing::instrument(skip_all, name = "interop")]
    fn generate(&self, input: &GeneratorInput<'_>) -> GeneratorOutput {
        let mut out = GeneratorOutput::default();
        for (decl, methods) in scan::method_holders(input.snapshot) {
            let Some(model) = model_for(decl, &methods, input.config) else {
                continue;
            };
            tracing::debug!(holder = %decl.qualified_name(), methods = model.methods.len(), "adapting");
            match Self::synthesize(&model, input.config) {
                Ok(unit) => out.push_unit(unit),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::source::{SourceFile, parse_declarations};
    use crate::model::Snapshot;

    const HOLDERS: &str = r#"
        pub trait IUnkHolderIgnore {
            #[preserve_sig]
            fn Ignore(&self, p1: Option<&IUnknown>, p2: &Guid,
                      #[marshal_as(IUnknown, iid_param = 1)] #[out] p3: &mut Option<IUnknown>) -> HRESULT;
        }

        pub mod test32 {
            pub trait IUnkHolder {
                /// Gets the object.
                #[preserve_sig]
                fn GetObj(&self, p1: Option<&IUnknown>, p2: &Guid,
                          #[marshal_as(IUnknown, iid_param = 1)] #[out] p3: &mut Option<IUnknown>,
                          p4: &mut NativeOverlapped, #[out] p5: &mut i64) -> HRESULT;
                fn GetObj2(&self, p1: f32, p2: &Guid,
                           #[marshal_as(IUnknown, iid_param = 1)] #[out] p3: &mut Option<IUnknown>);
                #[preserve_sig]
                fn Ignore1(&self, p1: Option<&IUnknown>, p2: &Guid, #[marshal_as(IUnknown)] p3: Option<&IUnknown>) -> HRESULT;
                #[preserve_sig]
                fn Ignore2(&self, p1: Option<&IUnknown>, p2: &Guid, #[marshal_as(IUnknown)] #[out] p3: &mut Option<IUnknown>) -> HRESULT;
                #[preserve_sig]
                fn Ignore3(&self, #[marshal_as(LPArray)] #[out] p3: &mut [i32]) -> HRESULT;
                #[suppress_auto_gen]
                #[preserve_sig]
                fn Ignore4(&self, p1: f32, p2: &Guid,
                           #[marshal_as(IUnknown, iid_param = 1)] #[out] p3: &mut Option<IUnknown>) -> HRESULT;
            }

            extern "system" {
                /// Gets the object.
                pub fn GetObj(p1: *mut c_void, p2: &Guid,
                              #[marshal_as(UnmanagedType::IUnknown, IidParameterIndex = 1)] #[out] p3: &mut Option<IUnknown>) -> HRESULT;
            }
        }
    "#;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot::new(parse_declarations(&SourceFile::new("decls.rs", text)).expect("parses"))
    }

    fn run(text: &str) -> GeneratorOutput {
        let snapshot = snapshot(text);
        let config = GeneratorConfig::default();
        InteropGenerator.generate(&GeneratorInput {
            snapshot: &snapshot,
            files: &[],
            config: &config,
        })
    }

    fn method<'a>(snap: &'a Snapshot, holder: &str, name: &str) -> &'a Method {
        snap.iter()
            .find(|d| d.name == holder)
            .and_then(|d| d.methods().find(|m| m.name == name))
            .expect("method exists")
    }

    #[test]
    fn classifies_each_method() {
        let snap = snapshot(HOLDERS);
        let config = GeneratorConfig::default();
        let skip = |holder: &str, name: &str| adapt(method(&snap, holder, name), HolderKind::Trait, &config).err();
        assert_eq!(skip("IUnkHolderIgnore", "Ignore"), None);
        assert_eq!(skip("IUnkHolder", "GetObj"), None);
        assert_eq!(skip("IUnkHolder", "GetObj2"), Some(Skip::NotStatusReturn));
        assert_eq!(skip("IUnkHolder", "Ignore1"), Some(Skip::NoInterfaceOut));
        assert_eq!(skip("IUnkHolder", "Ignore2"), Some(Skip::NoInterfaceOut));
        assert_eq!(skip("IUnkHolder", "Ignore3"), Some(Skip::NoInterfaceOut));
        assert_eq!(skip("IUnkHolder", "Ignore4"), Some(Skip::Suppressed));

        let foreign = method(&snap, "test32", "GetObj");
        assert!(adapt(foreign, HolderKind::Module, &config).is_ok());
    }

    #[test]
    fn one_unit_per_adaptable_holder() {
        let out = run(HOLDERS);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let names: Vec<_> = out.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "IUnkHolderIgnore.interop.g.rs",
                "test32.interop.g.rs",
                "test32.IUnkHolder.interop.g.rs",
            ]
        );
    }

    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn unit_text(name: &str) -> String {
        let out = run(HOLDERS);
        out.units
            .into_iter()
            .find(|u| u.name == name)
            .map(|u| u.text)
            .expect("unit")
    }

    #[test]
    fn trait_adapter_shape() {
        let text = unit_text("test32.IUnkHolder.interop.g.rs");
        let flat = squash(&text);
        assert!(text.contains("/// Gets the object."), "{text}");
        assert!(flat.contains("pubtraitIUnkHolderExt:IUnkHolder{"), "{text}");
        assert!(flat.contains("fnget_obj_as<T>(&self,p1:Option<&IUnknown>,p4:&mutNativeOverlapped,p5:&muti64"), "{text}");
        assert!(!flat.contains("p2:&Guid"), "{text}");
        assert!(flat.contains("letmutp3:Option<IUnknown>=::core::default::Default::default();"), "{text}");
        assert!(flat.contains("self.GetObj(p1,&<Tas::handlegen_runtime::Interface>::IID,&mutp3,p4,p5"), "{text}");
        assert!(flat.contains("::handlegen_runtime::cast::<_,T,HRESULT>(p3)"), "{text}");
        assert!(flat.contains("impl<H:IUnkHolder+?Sized>IUnkHolderExtforH{}"), "{text}");
        assert!(!flat.contains("get_obj2_as"), "{text}");
        assert!(!flat.contains("ignore"), "{text}");
    }

    #[test]
    fn foreign_adapter_shape() {
        let out = run(HOLDERS);
        let unit = out.units.iter().find(|u| u.name == "test32.interop.g.rs").expect("unit");
        assert_eq!(unit.module_path, vec!["test32".to_string()]);
        let flat = squash(&unit.text);
        assert!(flat.contains("pubunsafefnget_obj_as<T>(p1:*mutc_void)"), "{}", unit.text);
        assert!(unit.text.contains("/// # Safety"), "{}", unit.text);
        assert!(
            flat.contains("unsafe{GetObj(p1,&<Tas::handlegen_runtime::Interface>::IID,&mutp3"),
            "{}",
            unit.text
        );
    }

    #[test]
    fn iid_param_must_name_an_input() {
        let snap = snapshot(
            r#"
            pub trait Odd {
                #[preserve_sig]
                fn SelfRef(&self, #[marshal_as(IUnknown, iid_param = 0)] #[out] p: &mut Option<IUnknown>) -> HRESULT;
                #[preserve_sig]
                fn OutOfRange(&self, g: &Guid, #[marshal_as(IUnknown, iid_param = 5)] #[out] p: &mut Option<IUnknown>) -> HRESULT;
                #[preserve_sig]
                fn ByValue(&self, g: Guid, #[marshal_as(Interface, iid_param = 0)] #[out] p: &mut Option<IUnknown>) -> HRESULT;
            }
            "#,
        );
        let config = GeneratorConfig::default();
        let skip = |name: &str| adapt(method(&snap, "Odd", name), HolderKind::Trait, &config).err();
        assert_eq!(skip("SelfRef"), Some(Skip::BadIidParam));
        assert_eq!(skip("OutOfRange"), Some(Skip::BadIidParam));
        assert_eq!(skip("ByValue"), None);
    }

    #[test]
    fn status_type_is_configurable() {
        let snap = snapshot(
            r#"
            pub trait Holder {
                #[preserve_sig]
                fn Get(&self, g: &Guid, #[marshal_as(IUnknown, iid_param = 0)] #[out] p: &mut Option<IUnknown>) -> windows::core::HRESULT;
            }
            "#,
        );
        let m = method(&snap, "Holder", "Get");
        assert!(adapt(m, HolderKind::Trait, &GeneratorConfig::default()).is_ok());
        let other = GeneratorConfig::default().with_status_type("NTSTATUS");
        assert_eq!(adapt(m, HolderKind::Trait, &other).err(), Some(Skip::NotStatusReturn));
    }
}
