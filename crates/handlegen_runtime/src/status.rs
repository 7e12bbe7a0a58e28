//! Native status codes.

use std::fmt;

use thiserror::Error;

/// A native status value that adapted methods translate into `Result`.
pub trait Status: Copy + Sized {
    /// Status reported when an out value cannot be converted to the requested interface.
    const NO_INTERFACE: Self;

    /// Whether the status denotes success.
    fn succeeded(self) -> bool;

    /// Map success to `Ok(())` and anything else to `Err(self)`.
    fn into_result(self) -> Result<(), Self> {
        if self.succeeded() { Ok(()) } else { Err(self) }
    }
}

/// COM-style result code. Negative values are failures.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Error)]
#[error("HRESULT 0x{:08X}", .0)]
pub struct HRESULT(pub i32);

impl HRESULT {
    pub const S_OK: HRESULT = HRESULT(0);
    pub const S_FALSE: HRESULT = HRESULT(1);
    pub const E_NOTIMPL: HRESULT = HRESULT(0x8000_4001_u32 as i32);
    pub const E_NOINTERFACE: HRESULT = HRESULT(0x8000_4002_u32 as i32);
    pub const E_POINTER: HRESULT = HRESULT(0x8000_4003_u32 as i32);
    pub const E_FAIL: HRESULT = HRESULT(0x8000_4005_u32 as i32);
    pub const E_INVALIDARG: HRESULT = HRESULT(0x8007_0057_u32 as i32);

    /// Wrap a Win32 error code (`FACILITY_WIN32`).
    pub const fn from_win32(code: u32) -> HRESULT {
        if code == 0 {
            HRESULT::S_OK
        } else {
            HRESULT(((code & 0x0000_FFFF) | (7 << 16) | 0x8000_0000) as i32)
        }
    }

    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Shorthand for [`Status::into_result`].
    pub fn ok(self) -> Result<(), HRESULT> {
        Status::into_result(self)
    }
}

impl Status for HRESULT {
    const NO_INTERFACE: Self = HRESULT::E_NOINTERFACE;

    fn succeeded(self) -> bool {
        self.is_success()
    }
}

impl fmt::Debug for HRESULT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HRESULT(0x{:08X})", self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure() {
        assert!(HRESULT::S_OK.is_success());
        assert!(HRESULT::S_FALSE.is_success());
        assert!(HRESULT::E_FAIL.is_failure());
        assert_eq!(HRESULT::E_FAIL.ok(), Err(HRESULT::E_FAIL));
        assert_eq!(HRESULT::S_FALSE.ok(), Ok(()));
    }

    #[test]
    fn win32_mapping() {
        assert_eq!(HRESULT::from_win32(0), HRESULT::S_OK);
        assert_eq!(HRESULT::from_win32(87), HRESULT::E_INVALIDARG);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(HRESULT::E_NOINTERFACE.to_string(), "HRESULT 0x80004002");
        assert_eq!(format!("{:?}", HRESULT::S_OK), "HRESULT(0x00000000)");
    }
}
