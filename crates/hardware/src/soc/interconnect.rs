//! Device-side interconnect.
//!
//! This module implements the bus slave side that the driver talks to. It provides:
//! 1. **Target registration:** Targets are added by address range and sorted for lookup.
//! 2. **Burst acceptance:** One burst per `submit`, tagged by the issuer.
//! 3. **Timing:** A burst completes `latency + beats` bus cycles after acceptance; bursts to
//!    the same target complete in acceptance order, bursts to different targets may not.
//! 4. **Execution:** Reads return every lane of every beat; writes apply only strobed lanes.
//! 5. **Core port:** Direct zero-latency byte access for the core-under-test model.
//!
//! Bus time is counted separately from the device cycle counter and survives a reset.
//! Bursts still queued at a reset are dropped by `abort_in_flight` and never reach a
//! target.

use std::collections::VecDeque;

use tracing::trace;

use super::devices::CsrBlock;
use super::traits::{BusTarget, MemoryPort};
use crate::bus::{BurstDescriptor, ResponseCode, TransactionKind};
use crate::common::BusAddr;

/// A completed burst as seen on the response channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusReply {
    /// Tag supplied with the burst.
    pub tag: u64,
    /// Response code.
    pub code: ResponseCode,
    /// Full-beat read data (`beats * width` bytes); empty for writes and errors.
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct InFlight {
    tag: u64,
    kind: TransactionKind,
    descriptor: BurstDescriptor,
    data: Vec<u8>,
    target: Option<usize>,
    ready_at: u64,
    seq: u64,
}

/// Routes bursts to targets and models their completion timing.
pub struct Interconnect {
    targets: Vec<Box<dyn BusTarget>>,
    last_ready: Vec<u64>,
    in_flight: Vec<InFlight>,
    completed: VecDeque<BusReply>,
    now: u64,
    seq: u64,
}

impl std::fmt::Debug for Interconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interconnect")
            .field(
                "targets",
                &self.targets.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("in_flight", &self.in_flight.len())
            .field("completed", &self.completed.len())
            .field("now", &self.now)
            .finish()
    }
}

impl Default for Interconnect {
    fn default() -> Self {
        Self::new()
    }
}

impl Interconnect {
    /// Creates an interconnect with no targets.
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            last_ready: Vec::new(),
            in_flight: Vec::new(),
            completed: VecDeque::new(),
            now: 0,
            seq: 0,
        }
    }

    /// Registers a target; targets are kept sorted by base address.
    pub fn add_target(&mut self, target: Box<dyn BusTarget>) {
        self.targets.push(target);
        self.targets.sort_by_key(|t| t.address_range().0);
        self.last_ready = vec![self.now; self.targets.len()];
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Bus cycles elapsed since construction. Not affected by device reset.
    pub const fn bus_cycles(&self) -> u64 {
        self.now
    }

    /// Bursts accepted but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Drops every accepted burst that has not completed yet.
    ///
    /// Responses already on the response channel are kept.
    ///
    /// # Returns
    ///
    /// The number of bursts dropped.
    pub fn abort_in_flight(&mut self) -> usize {
        let dropped = self.in_flight.len();
        self.in_flight.clear();
        self.last_ready = vec![self.now; self.targets.len()];
        if dropped > 0 {
            trace!(dropped, "abort in-flight bursts");
        }
        dropped
    }

    /// Returns the cycles a burst of `beats` beats spends on a target with `latency`.
    pub const fn transit_time(latency: u64, beats: u64) -> u64 {
        latency + beats
    }

    fn find_target(&self, addr: u64) -> Option<usize> {
        self.targets.iter().position(|t| {
            let (base, size) = t.address_range();
            addr >= base && addr - base < size
        })
    }

    /// Accepts one burst.
    ///
    /// # Arguments
    ///
    /// * `tag` - Issuer tag returned with the response.
    /// * `kind` - Read or write.
    /// * `descriptor` - The burst.
    /// * `data` - Full-beat write data (`beats * width` bytes); ignored for reads. A write
    ///   with any other payload length answers `SLVERR` and touches nothing.
    pub fn submit(
        &mut self,
        tag: u64,
        kind: TransactionKind,
        descriptor: BurstDescriptor,
        data: Vec<u8>,
    ) {
        let target = self.find_target(descriptor.base.val());
        let ready_at = match target {
            Some(idx) => {
                let latency = self.targets[idx].latency();
                let at = (self.now + Self::transit_time(latency, descriptor.beats))
                    .max(self.last_ready[idx] + 1);
                self.last_ready[idx] = at;
                at
            }
            None => self.now + 1,
        };
        trace!(tag, %descriptor, ready_at, "accept {:?} burst", kind);
        self.seq += 1;
        self.in_flight.push(InFlight {
            tag,
            kind,
            descriptor,
            data,
            target,
            ready_at,
            seq: self.seq,
        });
    }

    /// Advances bus time by one cycle and completes every burst that is due.
    ///
    /// # Arguments
    ///
    /// * `cycle` - Current device cycle, forwarded to targets.
    pub fn tick(&mut self, cycle: u64) {
        self.now += 1;
        for target in &mut self.targets {
            target.tick(cycle);
        }

        let now = self.now;
        let mut due: Vec<InFlight> = Vec::new();
        let mut idx = 0;
        while idx < self.in_flight.len() {
            if self.in_flight[idx].ready_at <= now {
                due.push(self.in_flight.swap_remove(idx));
            } else {
                idx += 1;
            }
        }
        due.sort_by_key(|b| (b.ready_at, b.seq));
        for burst in due {
            let reply = self.execute(burst);
            trace!(tag = reply.tag, code = %reply.code, "complete burst");
            self.completed.push_back(reply);
        }
    }

    /// Pops the oldest completed response.
    pub fn take_response(&mut self) -> Option<BusReply> {
        self.completed.pop_front()
    }

    /// Returns the CSR block, if one is mapped.
    pub fn csr_mut(&mut self) -> Option<&mut CsrBlock> {
        self.targets.iter_mut().find_map(|t| t.as_csr_mut())
    }

    fn execute(&mut self, burst: InFlight) -> BusReply {
        let InFlight {
            tag,
            kind,
            descriptor: d,
            data,
            target,
            ..
        } = burst;
        let fail = |code| BusReply {
            tag,
            code,
            data: Vec::new(),
        };

        let Some(idx) = target else {
            return fail(ResponseCode::DecodeError);
        };
        let target = &mut self.targets[idx];
        let (base, size) = target.address_range();
        let offset = d.base.val() - base;
        if offset + d.span() > size {
            return fail(ResponseCode::DecodeError);
        }

        match kind {
            TransactionKind::Read => {
                let mut buf = vec![0u8; d.span() as usize];
                match target.read(offset, &mut buf) {
                    ResponseCode::Okay => BusReply {
                        tag,
                        code: ResponseCode::Okay,
                        data: buf,
                    },
                    code => fail(code),
                }
            }
            TransactionKind::Write => {
                if data.len() as u64 != d.span() {
                    return fail(ResponseCode::SlaveError);
                }
                for (lo, hi) in strobe_runs(&d) {
                    let code = target.write(offset + lo, &data[lo as usize..hi as usize]);
                    if !code.is_ok() {
                        return fail(code);
                    }
                }
                BusReply {
                    tag,
                    code: ResponseCode::Okay,
                    data: Vec::new(),
                }
            }
        }
    }
}

/// Maximal runs of strobed bytes in a burst, as `[lo, hi)` offsets from its base.
fn strobe_runs(d: &BurstDescriptor) -> Vec<(u64, u64)> {
    let mut runs: Vec<(u64, u64)> = Vec::new();
    for beat in 0..d.beats {
        let mask = d.strobe(beat);
        for lane in 0..d.width {
            if mask >> lane & 1 == 0 {
                continue;
            }
            let pos = beat * d.width + lane;
            match runs.last_mut() {
                Some((_, hi)) if *hi == pos => *hi = pos + 1,
                _ => runs.push((pos, pos + 1)),
            }
        }
    }
    runs
}

impl MemoryPort for Interconnect {
    fn read_bytes(&mut self, addr: BusAddr, buf: &mut [u8]) -> Result<(), ResponseCode> {
        let idx = self
            .find_target(addr.val())
            .ok_or(ResponseCode::DecodeError)?;
        let target = &mut self.targets[idx];
        let (base, size) = target.address_range();
        let offset = addr.val() - base;
        if offset + buf.len() as u64 > size {
            return Err(ResponseCode::DecodeError);
        }
        match target.read(offset, buf) {
            ResponseCode::Okay => Ok(()),
            code => Err(code),
        }
    }

    fn write_bytes(&mut self, addr: BusAddr, data: &[u8]) -> Result<(), ResponseCode> {
        let idx = self
            .find_target(addr.val())
            .ok_or(ResponseCode::DecodeError)?;
        let target = &mut self.targets[idx];
        let (base, size) = target.address_range();
        let offset = addr.val() - base;
        if offset + data.len() as u64 > size {
            return Err(ResponseCode::DecodeError);
        }
        match target.write(offset, data) {
            ResponseCode::Okay => Ok(()),
            code => Err(code),
        }
    }
}
