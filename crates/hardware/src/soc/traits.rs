//! Device-side access traits.
//!
//! This module defines the two ways the simulated device is accessed. It provides:
//! 1. **`BusTarget`:** A slave on the interconnect, addressed by region-relative offset and
//!    answering with a bus response code.
//! 2. **`MemoryPort`:** The core-side port the core-under-test uses to reach TCM directly,
//!    without going through the burst interface.
//!
//! Targets must be `Send + Sync` so that a driver can move to another thread or sit behind
//! a Python object.

use crate::bus::ResponseCode;
use crate::common::BusAddr;
use crate::soc::devices::CsrBlock;

/// A slave attached to the interconnect.
pub trait BusTarget: Send + Sync {
    /// Short name for diagnostics (e.g. `"dtcm"`).
    fn name(&self) -> &str;

    /// Returns `(base_address, size_in_bytes)`.
    fn address_range(&self) -> (u64, u64);

    /// Access latency in cycles, excluding per-beat transfer time.
    fn latency(&self) -> u64;

    /// Reads `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> ResponseCode;

    /// Writes `data` starting at `offset`.
    fn write(&mut self, offset: u64, data: &[u8]) -> ResponseCode;

    /// Observes the current cycle. Called once per clock edge.
    fn tick(&mut self, _cycle: u64) {}

    /// Returns a mutable reference as `CsrBlock` if this target is the CSR block.
    fn as_csr_mut(&mut self) -> Option<&mut CsrBlock> {
        None
    }
}

/// Byte-granular access used by the core-under-test.
pub trait MemoryPort {
    /// Reads `buf.len()` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// The response code of the target, or `DecodeError` if nothing is mapped there.
    fn read_bytes(&mut self, addr: BusAddr, buf: &mut [u8]) -> Result<(), ResponseCode>;

    /// Writes `data` at `addr`.
    ///
    /// # Errors
    ///
    /// The response code of the target, or `DecodeError` if nothing is mapped there.
    fn write_bytes(&mut self, addr: BusAddr, data: &[u8]) -> Result<(), ResponseCode>;
}
