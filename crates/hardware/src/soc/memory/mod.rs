//! Tightly-coupled memory.
//!
//! This module implements the TCM banks sitting behind the interconnect. It provides:
//! 1. **Buffer:** Zero-initialised backing storage with bounds-checked slice access.
//! 2. **TcmBank:** Bus target that maps the buffer at a base address with a fixed latency.

/// TCM backing storage.
pub mod buffer;

use self::buffer::TcmBuffer;
use crate::bus::ResponseCode;
use crate::soc::traits::BusTarget;

/// A TCM bank (instruction or data memory).
#[derive(Debug)]
pub struct TcmBank {
    name: String,
    buffer: TcmBuffer,
    base_addr: u64,
    latency: u64,
}

impl TcmBank {
    /// Creates a zero-filled bank of `size` bytes at `base_addr`.
    pub fn new(name: impl Into<String>, base_addr: u64, size: usize, latency: u64) -> Self {
        Self {
            name: name.into(),
            buffer: TcmBuffer::new(size),
            base_addr,
            latency,
        }
    }

    /// Read-only view of the whole bank, for inspection in tests and reports.
    pub fn contents(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

impl BusTarget for TcmBank {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, self.buffer.len() as u64)
    }

    fn latency(&self) -> u64 {
        self.latency
    }

    fn read(&mut self, offset: u64, buf: &mut [u8]) -> ResponseCode {
        match self.buffer.read_slice(offset as usize, buf.len()) {
            Some(bytes) => {
                buf.copy_from_slice(bytes);
                ResponseCode::Okay
            }
            None => ResponseCode::DecodeError,
        }
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> ResponseCode {
        if self.buffer.write_slice(offset as usize, data) {
            ResponseCode::Okay
        } else {
            ResponseCode::DecodeError
        }
    }
}
