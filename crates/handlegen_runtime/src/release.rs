//! Release policies used by generated safe handles.

use crate::handle::RawHandle;
use crate::status::{HRESULT, Status};

/// A type that knows how to release a raw native handle.
///
/// Named as the base type of `#[auto_safe_handle(None, Plain, Base)]` when no release expression is given.
pub trait ReleasePolicy {
    /// Release `handle`; return whether the release succeeded.
    fn release(handle: RawHandle) -> bool;
}

/// Policy for handles that own nothing that needs releasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRelease;

impl ReleasePolicy for NoRelease {
    fn release(_handle: RawHandle) -> bool {
        true
    }
}

/// Result types a release expression may evaluate to.
pub trait ReleaseOutcome {
    fn released(self) -> bool;
}

impl ReleaseOutcome for bool {
    fn released(self) -> bool {
        self
    }
}

impl ReleaseOutcome for () {
    fn released(self) -> bool {
        true
    }
}

/// Win32 `BOOL`: non-zero is success.
impl ReleaseOutcome for i32 {
    fn released(self) -> bool {
        self != 0
    }
}

impl ReleaseOutcome for HRESULT {
    fn released(self) -> bool {
        self.succeeded()
    }
}

impl<E> ReleaseOutcome for Result<(), E> {
    fn released(self) -> bool {
        self.is_ok()
    }
}
