//! Bus transaction codec.
//!
//! Converts a logical `(address, length)` request into bus-legal bursts and rebuilds
//! the caller's bytes from the burst responses. It performs:
//! 1. **Validation:** Zero-length and out-of-region requests are rejected before splitting.
//! 2. **Splitting:** Greedy walk from the first byte, taking the longest burst allowed by
//!    the beat limit and the burst boundary. Region bases and sizes are width-aligned, so
//!    a burst that ends at or before the request's last beat never leaves its region.
//! 3. **Packing:** Places write payload bytes on the correct lanes of each burst.
//! 4. **Reassembly:** Strips unstrobed lanes from read data and checks every response code.
//!
//! Every cut point in the walk is forced by either the beat limit or a boundary, so the
//! greedy split is also the minimal one.

use tracing::debug;

use super::descriptor::{BurstDescriptor, lane_mask};
use super::{TransactionKind, TransactionRequest, TransactionResponse};
use crate::common::{BusAddr, DriverError, Precondition, Result};
use crate::config::SystemConfig;
use crate::soc::region::MemoryMap;

/// Outcome of a reassembled transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Bytes read, in request order.
    Read(Vec<u8>),
    /// Every burst of the write was accepted.
    Write,
}

impl Completion {
    /// Returns the read bytes, or an empty vector for writes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Read(bytes) => bytes,
            Self::Write => Vec::new(),
        }
    }
}

/// Splits requests into bursts and reassembles responses for one bus geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Codec {
    width: u64,
    max_beats: u64,
    boundary: u64,
}

impl Codec {
    /// Creates a codec for the configured bus geometry.
    pub const fn new(system: &SystemConfig) -> Self {
        Self {
            width: system.bus_width,
            max_beats: system.max_burst_beats,
            boundary: system.burst_boundary,
        }
    }

    /// Bus width in bytes.
    pub const fn width(&self) -> u64 {
        self.width
    }

    /// Maximum beats per burst.
    pub const fn max_beats(&self) -> u64 {
        self.max_beats
    }

    /// Burst boundary in bytes.
    pub const fn boundary(&self) -> u64 {
        self.boundary
    }

    /// Splits `request` into the minimal ordered sequence of legal bursts.
    ///
    /// # Errors
    ///
    /// `Precondition::ZeroLength` for empty requests, `Precondition::Unmapped` or
    /// `Precondition::CrossesRegion` if the range is not inside exactly one region.
    pub fn split(
        &self,
        map: &MemoryMap,
        request: &TransactionRequest<'_>,
    ) -> Result<Vec<BurstDescriptor>> {
        if request.len == 0 {
            return Err(Precondition::ZeroLength(request.addr).into());
        }
        let region = map.locate(request.addr, request.len)?;
        let w = self.width;
        let start = request.addr.val();
        let end = start + request.len;

        let mut bursts = Vec::new();
        let mut cur = start;
        while cur < end {
            let base = cur & !(w - 1);
            let remaining = (end - base).div_ceil(w);
            let to_boundary = (self.boundary - (base & (self.boundary - 1))) / w;
            let beats = remaining.min(self.max_beats).min(to_boundary);
            let burst_end = base + beats * w;
            debug_assert!(burst_end <= region.end().val().next_multiple_of(w));

            let first_hi = end.min(base + w) - base;
            let first_mask = lane_mask(cur - base, first_hi);
            let last_base = burst_end - w;
            let last_mask = lane_mask(
                cur.max(last_base) - last_base,
                end.min(burst_end) - last_base,
            );

            bursts.push(BurstDescriptor {
                base: BusAddr(base),
                beats,
                width: w,
                first_mask,
                last_mask,
            });
            cur = burst_end.min(end);
        }

        debug!(
            addr = %request.addr,
            len = request.len,
            region = %region.name,
            bursts = bursts.len(),
            "split {:?} request",
            request.kind
        );
        Ok(bursts)
    }

    /// Builds the full-beat write data for one burst of `request`.
    ///
    /// Lanes outside the strobes are zero.
    pub fn pack_write(request: &TransactionRequest<'_>, descriptor: &BurstDescriptor) -> Vec<u8> {
        let mut data = vec![0u8; descriptor.span() as usize];
        let first = descriptor.first_byte().val();
        let src = (first - request.addr.val()) as usize;
        let dst = (first - descriptor.base.val()) as usize;
        let len = descriptor.valid_len() as usize;
        data[dst..dst + len].copy_from_slice(&request.payload[src..src + len]);
        data
    }

    /// Rebuilds the outcome of `request` from its responses, in issue order.
    ///
    /// # Errors
    ///
    /// `DriverError::BusResponse` for the first burst whose code is not `OKAY`, or whose
    /// read data is shorter than the burst. No partial data is returned.
    pub fn reassemble(
        request: &TransactionRequest<'_>,
        responses: &[TransactionResponse],
    ) -> Result<Completion> {
        debug_assert!(responses.windows(2).all(|p| p[0].descriptor.base < p[1].descriptor.base));

        if let Some(failed) = responses.iter().find(|r| !r.code.is_ok()) {
            return Err(DriverError::BusResponse {
                descriptor: failed.descriptor,
                code: failed.code,
            });
        }

        match request.kind {
            TransactionKind::Write => Ok(Completion::Write),
            TransactionKind::Read => {
                let mut out = Vec::with_capacity(request.len as usize);
                for resp in responses {
                    let d = &resp.descriptor;
                    let lo = (d.first_byte().val() - d.base.val()) as usize;
                    let hi = lo + d.valid_len() as usize;
                    let bytes = resp.data.get(lo..hi).ok_or(DriverError::BusResponse {
                        descriptor: *d,
                        code: super::ResponseCode::SlaveError,
                    })?;
                    out.extend_from_slice(bytes);
                }
                Ok(Completion::Read(out))
            }
        }
    }
}
