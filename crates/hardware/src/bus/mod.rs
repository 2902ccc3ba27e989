//! Bus transaction layer.
//!
//! This module turns logical reads and writes into bus bursts and back. It provides:
//! 1. **Descriptors:** `BurstDescriptor` and byte-lane mask helpers.
//! 2. **Codec:** Splits a request into the minimal ordered set of legal bursts and
//!    reassembles the responses.
//! 3. **Scheduler:** Issues bursts with a bounded pipeline and matches responses by tag.

/// Request splitting and response reassembly.
pub mod codec;

/// Burst descriptors and lane masks.
pub mod descriptor;

/// Pipelined burst issue and response matching.
pub mod scheduler;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::BusAddr;

pub use codec::{Codec, Completion};
pub use descriptor::BurstDescriptor;
pub use scheduler::{Scheduler, Ticket};

/// Response code returned by a bus target for one burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Normal completion.
    #[default]
    Okay,
    /// The target was reached but refused the access.
    SlaveError,
    /// No target decodes the address.
    DecodeError,
}

impl ResponseCode {
    /// Returns `true` for [`ResponseCode::Okay`].
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Okay)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Okay => "OKAY",
            Self::SlaveError => "SLVERR",
            Self::DecodeError => "DECERR",
        };
        f.write_str(name)
    }
}

/// Direction of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionKind {
    /// Bus read.
    Read,
    /// Bus write.
    Write,
}

/// A logical request for `len` bytes at `addr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionRequest<'a> {
    /// Direction.
    pub kind: TransactionKind,
    /// First byte.
    pub addr: BusAddr,
    /// Length in bytes.
    pub len: u64,
    /// Data to write; empty for reads.
    pub payload: &'a [u8],
}

impl<'a> TransactionRequest<'a> {
    /// Builds a read of `len` bytes.
    pub const fn read(addr: BusAddr, len: u64) -> Self {
        Self {
            kind: TransactionKind::Read,
            addr,
            len,
            payload: &[],
        }
    }

    /// Builds a write of `payload` at `addr`.
    pub const fn write(addr: BusAddr, payload: &'a [u8]) -> Self {
        Self {
            kind: TransactionKind::Write,
            addr,
            len: payload.len() as u64,
            payload,
        }
    }
}

/// The completed answer to one burst, matched back to its descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResponse {
    /// The burst this answers.
    pub descriptor: BurstDescriptor,
    /// Response code.
    pub code: ResponseCode,
    /// Full-beat read data (`descriptor.span()` bytes); empty for writes.
    pub data: Vec<u8>,
}
