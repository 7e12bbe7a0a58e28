//! Annotation vocabulary registry.
//!
//! This module centralizes recognized annotation spellings so the host adapter and the generators don't need
//! stringly-typed comparisons. Each annotation accepts its snake_case canonical name plus the CamelCase spellings
//! (with and without the `Attribute` suffix) used by existing interop declaration sources.

use crate::registry::{self, ItemInfo, Stability};

/// Stable identifier for supported annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationId {
    /// `#[auto_handle(interface?, underlying?)]` on a struct stub.
    AutoHandle,
    /// `#[auto_safe_handle(release?, plain, base?, underlying?)]` on a struct stub.
    AutoSafeHandle,
    /// `#[preserve_sig]` on a method: the method keeps the native status-code signature.
    PreserveSig,
    /// `#[suppress_auto_gen]` on a method: never adapt it.
    SuppressAutoGen,
    /// `#[marshal_as(kind, iid_param = N)]` on a parameter.
    MarshalAs,
    /// `#[out]` on a `&mut T` parameter: the callee writes, never reads.
    Out,
}

/// Named argument of `#[marshal_as(..)]` that points at the parameter carrying the interface id.
pub const MARSHAL_IID_PARAM_ARG: &str = "iid_param";

/// Accepted aliases for [`MARSHAL_IID_PARAM_ARG`].
pub const MARSHAL_IID_PARAM_ALIASES: &[&str] = &["IidParameterIndex", "iid_parameter_index"];

/// Metadata entry for an annotation.
pub type AnnotationInfo = ItemInfo<AnnotationId>;

/// Registry of supported annotations.
pub const ANNOTATIONS: &[AnnotationInfo] = &[
    info(
        AnnotationId::AutoHandle,
        "auto_handle",
        &["AutoHandle", "AutoHandleAttribute"],
        "Generate a native handle wrapper for a struct stub.",
    ),
    info(
        AnnotationId::AutoSafeHandle,
        "auto_safe_handle",
        &["AutoSafeHandle", "AutoSafeHandleAttribute"],
        "Generate a resource-owning wrapper that releases its handle on drop.",
    ),
    info(
        AnnotationId::PreserveSig,
        "preserve_sig",
        &["PreserveSig", "PreserveSigAttribute"],
        "Mark a method as keeping its native status-code signature.",
    ),
    info(
        AnnotationId::SuppressAutoGen,
        "suppress_auto_gen",
        &["SuppressAutoGen", "SuppressAutoGenAttribute"],
        "Opt a method out of adapter generation.",
    ),
    info(
        AnnotationId::MarshalAs,
        "marshal_as",
        &["MarshalAs", "MarshalAsAttribute"],
        "Describe how a parameter is marshaled across the native boundary.",
    ),
    info(
        AnnotationId::Out,
        "out",
        &["Out", "OutAttribute"],
        "Mark a by-reference parameter as output only.",
    ),
];

/// Resolve an annotation name (last path segment as written) to its stable id.
pub fn from_str(name: &str) -> Option<AnnotationId> {
    registry::lookup(ANNOTATIONS, name)
}

/// Return the canonical spelling for an annotation.
pub fn as_str(id: AnnotationId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for an annotation.
pub fn info_for(id: AnnotationId) -> &'static AnnotationInfo {
    ANNOTATIONS
        .iter()
        .find(|a| a.id == id)
        .expect("INVARIANT: every AnnotationId has a registry entry")
}

/// Check whether a named `marshal_as` argument designates the interface-id parameter.
pub fn is_iid_param_arg(name: &str) -> bool {
    name == MARSHAL_IID_PARAM_ARG || MARSHAL_IID_PARAM_ALIASES.contains(&name)
}

/// Stable identifier for marshaling kinds named by `#[marshal_as(..)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarshalKind {
    IUnknown,
    IInspectable,
    Interface,
    IDispatch,
    Bool,
    LpArray,
    LpWStr,
    LpStr,
    Struct,
}

impl MarshalKind {
    /// Whether an out parameter with this hint can be returned as a queried interface.
    pub fn is_interface_like(self) -> bool {
        matches!(self, MarshalKind::IUnknown | MarshalKind::IInspectable | MarshalKind::Interface)
    }
}

/// Metadata entry for a marshal kind.
pub type MarshalKindInfo = ItemInfo<MarshalKind>;

/// Registry of marshal kinds. Lookups strip an `UnmanagedType::` style prefix first (see [`marshal_kind`]).
pub const MARSHAL_KINDS: &[MarshalKindInfo] = &[
    info(MarshalKind::IUnknown, "IUnknown", &["iunknown"], "COM `IUnknown` pointer."),
    info(MarshalKind::IInspectable, "IInspectable", &["iinspectable"], "WinRT `IInspectable` pointer."),
    info(MarshalKind::Interface, "Interface", &["interface"], "Interface pointer of the declared type."),
    info(MarshalKind::IDispatch, "IDispatch", &["idispatch"], "Automation `IDispatch` pointer."),
    info(MarshalKind::Bool, "Bool", &["bool"], "Four-byte Win32 `BOOL`."),
    info(MarshalKind::LpArray, "LPArray", &["lp_array", "LpArray"], "C-style array."),
    info(MarshalKind::LpWStr, "LPWStr", &["lp_wstr", "LpWStr"], "NUL-terminated UTF-16 string."),
    info(MarshalKind::LpStr, "LPStr", &["lp_str", "LpStr"], "NUL-terminated ANSI string."),
    info(MarshalKind::Struct, "Struct", &["struct"], "Structure passed by value."),
];

/// Resolve a marshal kind spelling, accepting `UnmanagedType::IUnknown` style paths.
pub fn marshal_kind(name: &str) -> Option<MarshalKind> {
    let last = name.rsplit("::").next().unwrap_or(name).rsplit('.').next().unwrap_or(name);
    registry::lookup(MARSHAL_KINDS, last.trim())
}

const fn info<Id>(id: Id, canonical: &'static str, aliases: &'static [&'static str], description: &'static str) -> ItemInfo<Id> {
    ItemInfo {
        id,
        canonical,
        aliases,
        description,
        since_version: Some("0.1.0"),
        stability: Stability::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_and_attribute_spellings() {
        assert_eq!(from_str("auto_handle"), Some(AnnotationId::AutoHandle));
        assert_eq!(from_str("AutoSafeHandleAttribute"), Some(AnnotationId::AutoSafeHandle));
        assert_eq!(from_str("PreserveSig"), Some(AnnotationId::PreserveSig));
        assert_eq!(from_str("derive"), None);
    }

    #[test]
    fn every_id_round_trips_through_canonical_name() {
        for entry in ANNOTATIONS {
            assert_eq!(from_str(as_str(entry.id)), Some(entry.id));
        }
    }

    #[test]
    fn marshal_kind_strips_paths() {
        assert_eq!(marshal_kind("UnmanagedType::IUnknown"), Some(MarshalKind::IUnknown));
        assert_eq!(marshal_kind("UnmanagedType.LPArray"), Some(MarshalKind::LpArray));
        assert_eq!(marshal_kind("Bogus"), None);
        assert!(MarshalKind::Interface.is_interface_like());
        assert!(!MarshalKind::LpArray.is_interface_like());
    }

    #[test]
    fn iid_param_aliases() {
        assert!(is_iid_param_arg("iid_param"));
        assert!(is_iid_param_arg("IidParameterIndex"));
        assert!(!is_iid_param_arg("size_param"));
    }
}
