//! The handle marker trait implemented by every generated wrapper.

/// Raw native handle value, pointer-sized like the platform's `HANDLE`.
pub type RawHandle = isize;

/// A lightweight value wrapping a native resource identifier.
///
/// Generated wrappers implement this trait; interface traits named in `#[auto_handle(Interface)]` are expected to be
/// marker sub-traits (`pub trait IGdiObjectHandle: IHandle {}`).
pub trait IHandle {
    /// The native value, widened to [`RawHandle`].
    fn raw(&self) -> RawHandle;

    /// Whether the handle is the null value.
    fn is_null(&self) -> bool {
        self.raw() == 0
    }
}

impl IHandle for RawHandle {
    fn raw(&self) -> RawHandle {
        *self
    }
}

impl<H: IHandle + ?Sized> IHandle for &H {
    fn raw(&self) -> RawHandle {
        (**self).raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake(RawHandle);

    impl IHandle for Fake {
        fn raw(&self) -> RawHandle {
            self.0
        }
    }

    #[test]
    fn null_is_zero() {
        assert!(Fake(0).is_null());
        assert!(!Fake(42).is_null());
    }

    #[test]
    fn references_forward() {
        let h = Fake(7);
        assert_eq!(IHandle::raw(&&h), 7);
        assert_eq!(IHandle::raw(&7isize), 7);
    }
}
