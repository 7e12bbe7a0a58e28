//! Interface identities and out-value casting for adapted methods.

use std::fmt;

use crate::status::Status;

/// A 128-bit interface identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn from_u128(value: u128) -> Guid {
        Guid {
            data1: (value >> 96) as u32,
            data2: (value >> 80 & 0xFFFF) as u16,
            data3: (value >> 64 & 0xFFFF) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | u64::from_be_bytes(self.data4) as u128
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{self}}}")
    }
}

/// A type that can be requested from an adapted method by its interface id.
pub trait Interface {
    const IID: Guid;
}

/// Convert an out value produced by a native call into the requested interface.
///
/// A failed conversion is reported as the status type's `NO_INTERFACE` value.
pub fn cast<U, T, S>(value: U) -> Result<T, S>
where
    T: Interface + TryFrom<U>,
    S: Status,
{
    T::try_from(value).map_err(|_| S::NO_INTERFACE)
}
