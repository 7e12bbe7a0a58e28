//! Safe handle stubs for the auto_safe_handle generator.

pub mod test32 {
    /// Owning wrapper over `HTEST`.
    #[auto_safe_handle("CloseTest(handle)", HTEST)]
    pub struct SafeHTEST;
}

/// Owning wrapper that never releases.
#[auto_safe_handle(None, HSAMPLE)]
pub struct SafeHSAMPLE {}
