//! Shared interop conventions (well-known identifiers).

/// Default path of the runtime support crate that generated code links against.
pub const DEFAULT_RUNTIME_PATH: &str = "::handlegen_runtime";

/// Marker trait implemented by every generated handle (relative to the runtime path).
pub const HANDLE_TRAIT: &str = "IHandle";

/// Trait implemented by interface types returned from adapted methods (relative to the runtime path).
pub const INTERFACE_TRAIT: &str = "Interface";

/// Trait implemented by native status types (relative to the runtime path).
pub const STATUS_TRAIT: &str = "Status";

/// Trait implemented by release policy types (relative to the runtime path).
pub const RELEASE_POLICY_TRAIT: &str = "ReleasePolicy";

/// Trait converting release expression results into success flags (relative to the runtime path).
pub const RELEASE_OUTCOME_TRAIT: &str = "ReleaseOutcome";

/// Release policy assumed when a safe handle names neither a release expression nor a base type.
pub const NO_RELEASE_POLICY: &str = "NoRelease";

/// Runtime alias for the raw native handle value.
pub const RAW_HANDLE_ALIAS: &str = "RawHandle";

/// Designated return type of native status-code methods.
pub const DEFAULT_STATUS_TYPE: &str = "HRESULT";

/// Default stored representation of a handle.
pub const DEFAULT_RAW_TYPE: &str = "isize";

/// Name of the private field holding the native value in generated wrappers.
pub const HANDLE_FIELD: &str = "handle";

/// Binding name visible to release expressions.
pub const RELEASE_BINDING: &str = "handle";

/// Data files whose name ends with this suffix feed the file-driven generator.
pub const DEFAULT_HANDLES_FILE_SUFFIX: &str = "handles.csv";

/// Suffix appended to adapted method names (`get_obj` -> `get_obj_as`).
pub const DEFAULT_ADAPTED_SUFFIX: &str = "_as";

/// Suffix appended to a trait name for its generated extension trait.
pub const DEFAULT_EXTENSION_TRAIT_SUFFIX: &str = "Ext";

/// Type parameter introduced by adapted methods.
pub const ADAPTED_TYPE_PARAM: &str = "T";

/// Primitive integer types accepted as a handle representation.
pub const PRIMITIVE_REPRS: &[&str] = &["isize", "usize", "i64", "u64", "i32", "u32", "i16", "u16", "i8", "u8"];

/// Check whether a type name is a primitive integer representation.
pub fn is_primitive_repr(name: &str) -> bool {
    PRIMITIVE_REPRS.contains(&name)
}

/// Tokens accepted as an explicitly omitted annotation slot.
pub const OMITTED_ARG_SPELLINGS: &[&str] = &["_", "None", "null"];

/// Check whether a path-like token spells an omitted annotation slot.
pub fn is_omitted_spelling(token: &str) -> bool {
    OMITTED_ARG_SPELLINGS.contains(&token)
}
