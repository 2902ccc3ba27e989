//! Transaction scheduler.
//!
//! Issues bursts to the device in codec order and matches responses back to them. It
//! provides:
//! 1. **Tagging:** Every burst carries a unique tag; responses are matched by tag, so bursts
//!    to regions with different latencies may complete out of order.
//! 2. **Pipelining:** Up to `pipeline_depth` bursts may be in flight. Issuing one more
//!    advances the clock until a response frees a slot.
//! 3. **Draining:** Returns responses in issue order once every burst has answered.
//! 4. **Cancellation:** Abandoned bursts are remembered by tag so their late responses are
//!    discarded instead of matched.
//!
//! Every wait for a response is bounded by the response timeout. When it expires all
//! outstanding bursts are abandoned and the caller gets `DriverError::ResponseTimeout`.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{trace, warn};

use super::{BurstDescriptor, TransactionKind, TransactionResponse};
use crate::common::{DriverError, Result};
use crate::config::SystemConfig;
use crate::core::{ExecutionController, Hart};
use crate::stats::BusStats;

/// Handle for one issued burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket {
    tag: u64,
}

impl Ticket {
    /// The tag carried on the bus.
    pub const fn tag(self) -> u64 {
        self.tag
    }
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    tag: u64,
    descriptor: BurstDescriptor,
}

/// Pipelined burst issuer.
#[derive(Debug)]
pub struct Scheduler {
    depth: usize,
    response_timeout: u64,
    trace: bool,
    next_tag: u64,
    outstanding: VecDeque<Pending>,
    completed: HashMap<u64, TransactionResponse>,
    abandoned: HashSet<u64>,
    stats: BusStats,
}

impl Scheduler {
    /// Creates a scheduler for the configured pipeline depth and response timeout.
    ///
    /// # Arguments
    ///
    /// * `system` - Bus configuration.
    /// * `trace` - Log every burst issue and completion.
    pub fn new(system: &SystemConfig, trace: bool) -> Self {
        Self {
            depth: system.pipeline_depth.max(1),
            response_timeout: system.response_timeout_cycles,
            trace,
            next_tag: 0,
            outstanding: VecDeque::new(),
            completed: HashMap::new(),
            abandoned: HashSet::new(),
            stats: BusStats::default(),
        }
    }

    /// Maximum bursts in flight.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Bursts issued but not yet answered.
    pub fn in_flight(&self) -> usize {
        self.outstanding.len() - self.completed.len()
    }

    /// Bursts issued since the last drain, answered or not.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Counters.
    pub const fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// Mutable counters, for the request-level figures kept by the driver.
    pub fn stats_mut(&mut self) -> &mut BusStats {
        &mut self.stats
    }

    /// Puts one burst on the bus, first waiting for a free pipeline slot.
    ///
    /// # Arguments
    ///
    /// * `ctl` - Controller owning the clock and the bus.
    /// * `kind` - Read or write.
    /// * `descriptor` - The burst.
    /// * `data` - Full-beat write data; empty for reads.
    ///
    /// # Errors
    ///
    /// `DriverError::ResponseTimeout` if no slot frees up within the response timeout.
    pub fn issue<H: Hart>(
        &mut self,
        ctl: &mut ExecutionController<H>,
        kind: TransactionKind,
        descriptor: BurstDescriptor,
        data: Vec<u8>,
    ) -> Result<Ticket> {
        while self.in_flight() >= self.depth {
            self.wait_progress(ctl)?;
        }

        let tag = self.next_tag;
        self.next_tag += 1;
        if self.trace {
            trace!(tag, %descriptor, cycle = ctl.cycles(), "issue {:?}", kind);
        }
        ctl.bus_mut().submit(tag, kind, descriptor, data);
        self.outstanding.push_back(Pending { tag, descriptor });

        self.stats.bursts_issued += 1;
        self.stats.beats_issued += descriptor.beats;
        self.stats.peak_outstanding = self.stats.peak_outstanding.max(self.in_flight() as u64);
        Ok(Ticket { tag })
    }

    /// Waits for every issued burst and returns the responses in issue order.
    ///
    /// Non-OK responses are returned as-is; the codec turns them into errors.
    ///
    /// # Errors
    ///
    /// `DriverError::ResponseTimeout` if a response does not arrive in time. All
    /// outstanding bursts are abandoned in that case.
    pub fn drain<H: Hart>(
        &mut self,
        ctl: &mut ExecutionController<H>,
    ) -> Result<Vec<TransactionResponse>> {
        while self.in_flight() > 0 {
            self.wait_progress(ctl)?;
        }
        let completed = &mut self.completed;
        let responses: Vec<TransactionResponse> = self
            .outstanding
            .drain(..)
            .filter_map(|p| completed.remove(&p.tag))
            .collect();
        Ok(responses)
    }

    /// Abandons every outstanding burst.
    ///
    /// Responses already received are dropped; responses still in flight will be
    /// discarded when they arrive.
    ///
    /// # Returns
    ///
    /// The number of bursts that were still in flight.
    pub fn abandon_outstanding(&mut self) -> usize {
        let mut in_flight = 0;
        for p in self.outstanding.drain(..) {
            if self.completed.remove(&p.tag).is_none() {
                let _ = self.abandoned.insert(p.tag);
                in_flight += 1;
            }
        }
        if in_flight > 0 {
            warn!(in_flight, "abandoning outstanding bursts");
        }
        in_flight
    }

    /// Resets the device and forgets every burst issued before it.
    ///
    /// Outstanding bursts are abandoned, the interconnect drops those it has not
    /// completed, and responses already on the bus are discarded.
    pub fn reset<H: Hart>(&mut self, ctl: &mut ExecutionController<H>) {
        let _ = self.abandon_outstanding();
        ctl.reset();
        let _ = self.collect(ctl);
        self.abandoned.clear();
        self.completed.clear();
    }

    /// Advances the clock until at least one response is matched.
    fn wait_progress<H: Hart>(&mut self, ctl: &mut ExecutionController<H>) -> Result<()> {
        let mut waited = 0;
        loop {
            if self.collect(ctl) > 0 {
                return Ok(());
            }
            if waited >= self.response_timeout {
                let outstanding = self.abandon_outstanding();
                return Err(DriverError::ResponseTimeout {
                    outstanding,
                    cycles: self.response_timeout,
                });
            }
            ctl.cycle();
            waited += 1;
        }
    }

    /// Pulls every available response off the bus; returns how many were matched.
    fn collect<H: Hart>(&mut self, ctl: &mut ExecutionController<H>) -> usize {
        let mut matched = 0;
        while let Some(reply) = ctl.bus_mut().take_response() {
            if self.abandoned.remove(&reply.tag) {
                self.stats.abandoned_responses += 1;
                warn!(tag = reply.tag, code = %reply.code, "discarding response to abandoned burst");
                continue;
            }
            let Some(pending) = self.outstanding.iter().find(|p| p.tag == reply.tag) else {
                self.stats.stray_responses += 1;
                warn!(tag = reply.tag, code = %reply.code, "discarding response with unknown tag");
                continue;
            };
            if self.trace {
                trace!(tag = reply.tag, code = %reply.code, cycle = ctl.cycles(), "complete");
            }
            self.stats.responses += 1;
            if !reply.code.is_ok() {
                self.stats.bus_errors += 1;
            }
            let _ = self.completed.insert(
                reply.tag,
                TransactionResponse {
                    descriptor: pending.descriptor,
                    code: reply.code,
                    data: reply.data,
                },
            );
            matched += 1;
        }
        matched
    }
}
