//! Driver error definitions.
//!
//! This module defines the error taxonomy for the bus-transaction driver. It provides:
//! 1. **Preconditions:** Requests rejected before any bus activity (zero length, bad buffer,
//!    bus access during reset, out-of-bounds or region-crossing ranges, illegal commands).
//! 2. **Bus Responses:** `SLAVE_ERROR` / `DECODE_ERROR` answers that abort a logical transaction.
//! 3. **Timeouts:** A hardware condition or bus response that did not arrive within its cycle budget.
//! 4. **Images and Configuration:** Failures from the image resolver and config validation.
//!
//! Every error is returned synchronously to the call that caused it. The driver never retries.

use std::path::PathBuf;

use thiserror::Error;

use super::addr::BusAddr;
use crate::bus::{BurstDescriptor, ResponseCode};
use crate::core::{DeviceState, WaitCondition};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Top-level error returned by every fallible driver operation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The request was rejected before anything was issued on the bus.
    #[error("precondition violated: {0}")]
    Precondition(#[from] Precondition),

    /// A burst completed with a non-OK response code.
    ///
    /// The enclosing logical transaction is aborted; no partial data is returned.
    #[error("bus answered {code} for burst {descriptor}")]
    BusResponse {
        /// The burst that failed.
        descriptor: BurstDescriptor,
        /// The response code reported by the target.
        code: ResponseCode,
    },

    /// A hardware condition was not observed within its cycle budget.
    #[error("timed out after {cycles} cycles waiting for {condition}")]
    Timeout {
        /// What the driver was waiting for.
        condition: WaitCondition,
        /// The cycle budget that was exhausted.
        cycles: u64,
    },

    /// No burst response arrived within the response timeout.
    ///
    /// Every outstanding burst is abandoned; its late response is discarded.
    #[error("no bus response within {cycles} cycles ({outstanding} bursts abandoned)")]
    ResponseTimeout {
        /// Bursts that were outstanding and are now abandoned.
        outstanding: usize,
        /// The response timeout in cycles.
        cycles: u64,
    },

    /// The executable image could not be parsed.
    #[error("invalid image: {0}")]
    Image(#[from] object::read::Error),

    /// The executable image could not be read from disk.
    #[error("cannot read image {}: {source}", path.display())]
    ImageIo {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration describes an impossible bus or memory map.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DriverError {
    /// Returns the precondition if this error is a precondition violation.
    pub const fn precondition(&self) -> Option<&Precondition> {
        match self {
            Self::Precondition(p) => Some(p),
            _ => None,
        }
    }

    /// Returns `true` for timeouts, so callers can tell "device never signaled"
    /// apart from "device signaled an error".
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ResponseTimeout { .. })
    }
}

/// Requests rejected before any bus transaction is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    /// A read or write of zero bytes.
    #[error("zero-length transaction at {0}")]
    ZeroLength(BusAddr),

    /// A host payload that is not a contiguous byte-addressable buffer.
    #[error("payload of type `{type_name}` is not a contiguous byte buffer")]
    NotAByteBuffer {
        /// Host-side type name of the rejected value.
        type_name: String,
    },

    /// A bus access while the device is held in reset.
    #[error("bus access to {0} while the device is held in reset")]
    DeviceInReset(BusAddr),

    /// The range does not start inside any configured region.
    #[error("{len} bytes at {addr} fall outside every memory region")]
    Unmapped {
        /// First byte of the request.
        addr: BusAddr,
        /// Length of the request in bytes.
        len: u64,
    },

    /// The range starts inside a region but runs past its end.
    #[error("{len} bytes at {addr} cross the end of region `{region}`")]
    CrossesRegion {
        /// First byte of the request.
        addr: BusAddr,
        /// Length of the request in bytes.
        len: u64,
        /// Name of the region the request starts in.
        region: String,
    },

    /// A lifecycle command that is not legal in the current device state.
    #[error("cannot {operation} while the device is {state}")]
    InvalidState {
        /// The rejected command.
        operation: &'static str,
        /// The state the device was in.
        state: DeviceState,
    },

    /// `read_register` was given a name the core model does not expose.
    #[error("unknown register `{0}`")]
    UnknownRegister(String),

    /// A requested symbol resolved to address 0.
    #[error("symbol `{0}` did not resolve to an address")]
    UnresolvedSymbol(String),
}

impl Precondition {
    /// Returns `true` for the alignment-or-bounds subtype caught at split time.
    pub const fn is_alignment_or_bounds(&self) -> bool {
        matches!(self, Self::Unmapped { .. } | Self::CrossesRegion { .. })
    }
}
