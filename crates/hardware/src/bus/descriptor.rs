//! Burst descriptors and byte-lane masks.
//!
//! A burst covers `beats` consecutive bus-width beats starting at a width-aligned base.
//! Only the first and last beat may be partial; their valid byte lanes are carried as
//! bitmasks (bit `i` = byte lane `i`). Interior beats always strobe every lane.

use std::fmt;

use serde::Serialize;

use crate::common::BusAddr;

/// Returns a mask with lanes `lo..hi` set.
///
/// `hi` may be at most 64.
#[inline]
pub const fn lane_mask(lo: u64, hi: u64) -> u64 {
    full_mask(hi) & !full_mask(lo)
}

/// Returns a mask with the low `lanes` bits set.
#[inline]
pub const fn full_mask(lanes: u64) -> u64 {
    if lanes >= 64 { u64::MAX } else { (1u64 << lanes) - 1 }
}

/// One bus-legal burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BurstDescriptor {
    /// First beat address; always a multiple of `width`.
    pub base: BusAddr,
    /// Number of beats (at least 1).
    pub beats: u64,
    /// Bus width in bytes.
    pub width: u64,
    /// Valid lanes of the first beat.
    pub first_mask: u64,
    /// Valid lanes of the last beat. Equal to `first_mask` for single-beat bursts.
    pub last_mask: u64,
}

impl BurstDescriptor {
    /// Address one past the last beat.
    pub const fn end(&self) -> BusAddr {
        BusAddr(self.base.0 + self.beats * self.width)
    }

    /// Total bytes moved on the bus, including unstrobed lanes.
    pub const fn span(&self) -> u64 {
        self.beats * self.width
    }

    /// Address of the first valid byte.
    pub const fn first_byte(&self) -> BusAddr {
        BusAddr(self.base.0 + self.first_mask.trailing_zeros() as u64)
    }

    /// Address one past the last valid byte.
    pub const fn valid_end(&self) -> BusAddr {
        let last_beat = self.base.0 + (self.beats - 1) * self.width;
        BusAddr(last_beat + (64 - self.last_mask.leading_zeros() as u64))
    }

    /// Number of valid bytes carried by the burst.
    pub const fn valid_len(&self) -> u64 {
        self.valid_end().0 - self.first_byte().0
    }

    /// Write strobe for beat `beat`.
    pub const fn strobe(&self, beat: u64) -> u64 {
        if beat == 0 {
            self.first_mask
        } else if beat + 1 == self.beats {
            self.last_mask
        } else {
            full_mask(self.width)
        }
    }
}

impl fmt::Display for BurstDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} [first {:#x}, last {:#x}]",
            self.base, self.beats, self.first_mask, self.last_mask
        )
    }
}
