//! Handle stubs for the auto_handle generator.

/// Handle to a sample object.
#[auto_handle]
pub struct HSAMPLE;

pub mod test32 {
    /// Handle to a pen.
    #[auto_handle(IGraphicsObjectHandle, HGDIOBJ)]
    pub struct HPEN {}
}
