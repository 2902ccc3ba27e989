//! TCM buffer implementation.
//!
//! TCM banks are small (hundreds of KiB), so the backing store is a plain `Vec<u8>`.
//! Out-of-range accesses are reported to the caller instead of panicking so the
//! interconnect can turn them into bus errors.

use std::ops::Range;

/// Zero-initialised byte storage for one TCM bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcmBuffer {
    bytes: Vec<u8>,
}

impl TcmBuffer {
    /// Creates a zero-filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, offset: usize, len: usize) -> Option<Range<usize>> {
        let end = offset.checked_add(len)?;
        (end <= self.bytes.len()).then_some(offset..end)
    }

    /// Returns `len` bytes at `offset`, or `None` if the range is out of bounds.
    pub fn read_slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let range = self.range(offset, len)?;
        Some(&self.bytes[range])
    }

    /// Copies `data` to `offset`; returns `false` (writing nothing) if out of bounds.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) -> bool {
        match self.range(offset, data.len()) {
            Some(range) => {
                self.bytes[range].copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}
