//! Bus address type.
//!
//! This module defines a strong type for addresses on the device bus so that
//! bus addresses, region offsets and buffer indices are not mixed up. It provides:
//! 1. **Type Safety:** Distinguishes absolute bus addresses from region-relative offsets.
//! 2. **Alignment Helpers:** Rounding to the bus data width and alignment checks.
//! 3. **Formatting:** Hexadecimal `Display` for diagnostics and error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An absolute address in the device's physical bus address space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusAddr(pub u64);

impl BusAddr {
    /// Creates a new bus address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Rounds the address down to a multiple of `width`.
    ///
    /// `width` must be a power of two.
    #[inline]
    pub const fn align_down(self, width: u64) -> Self {
        Self(self.0 & !(width - 1))
    }

    /// Returns the byte offset of this address within its `width`-aligned block.
    ///
    /// `width` must be a power of two.
    #[inline]
    pub const fn misalignment(self, width: u64) -> u64 {
        self.0 & (width - 1)
    }

    /// Returns `true` if the address is a multiple of `width` (a power of two).
    #[inline]
    pub const fn is_aligned(self, width: u64) -> bool {
        self.misalignment(width) == 0
    }

    /// Returns the address `bytes` further along, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, bytes: u64) -> Option<Self> {
        match self.0.checked_add(bytes) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl From<u64> for BusAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl fmt::Display for BusAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
