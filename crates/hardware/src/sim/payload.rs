//! Host payload descriptions.
//!
//! The Rust API writes `&[u8]` and needs no runtime check. Callers on the other side of a
//! language boundary hand over arbitrary host objects; they describe what they got with a
//! `HostBuffer` and the driver accepts only contiguous byte-addressable buffers.

use crate::common::Precondition;

/// A host-side value offered as write payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostBuffer<'a> {
    /// A contiguous buffer exposed through a buffer protocol.
    Contiguous {
        /// The raw bytes.
        bytes: &'a [u8],
        /// Size of one element in bytes (1 for byte arrays).
        item_size: usize,
    },
    /// A buffer whose elements are not laid out contiguously.
    Strided {
        /// Host-side type name.
        type_name: &'a str,
    },
    /// A value that exposes no buffer at all (a list, a string, a number).
    Opaque {
        /// Host-side type name.
        type_name: &'a str,
    },
}

impl<'a> HostBuffer<'a> {
    /// Wraps a plain byte slice.
    pub const fn bytes(bytes: &'a [u8]) -> Self {
        Self::Contiguous {
            bytes,
            item_size: 1,
        }
    }

    /// Returns the payload bytes if this is a contiguous buffer.
    ///
    /// Multi-byte element buffers are accepted and written in their in-memory layout.
    ///
    /// # Errors
    ///
    /// `Precondition::NotAByteBuffer` for strided or opaque values.
    pub fn as_bytes(&self) -> Result<&'a [u8], Precondition> {
        match *self {
            Self::Contiguous { bytes, .. } => Ok(bytes),
            Self::Strided { type_name } | Self::Opaque { type_name } => {
                Err(Precondition::NotAByteBuffer {
                    type_name: type_name.to_owned(),
                })
            }
        }
    }
}
