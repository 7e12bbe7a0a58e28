//! Support library for handlegen-generated Rust code.
//!
//! Generated handle wrappers, safe handles and interop adapters refer to the items in this crate by absolute path
//! (`::handlegen_runtime::IHandle`, ...). Hand-written code uses the same items to define interfaces, release policies
//! and status types that generated code plugs into.

#![deny(clippy::unwrap_used)]

pub mod handle;
pub mod interface;
pub mod release;
pub mod status;

pub use handle::{IHandle, RawHandle};
pub use interface::{Guid, Interface, cast};
pub use release::{NoRelease, ReleaseOutcome, ReleasePolicy};
pub use status::{HRESULT, Status};
