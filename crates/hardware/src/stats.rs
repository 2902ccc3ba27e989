//! Bus statistics collection and reporting.
//!
//! This module tracks what the driver did on the bus. It provides:
//! 1. **Request counters:** Logical reads and writes and the bytes they moved.
//! 2. **Burst counters:** Bursts and beats issued, responses matched, bus errors.
//! 3. **Cancellation counters:** Responses discarded because their burst was abandoned,
//!    and responses that matched no burst at all.
//! 4. **Report:** A serializable snapshot of state, cycles and counters with a text summary.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::DeviceState;

/// Counters maintained by the driver and its scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Logical read requests completed.
    pub requests_read: u64,
    /// Logical write requests completed.
    pub requests_written: u64,
    /// Bytes returned to callers by reads.
    pub bytes_read: u64,
    /// Bytes accepted from callers by writes.
    pub bytes_written: u64,
    /// Bursts put on the bus.
    pub bursts_issued: u64,
    /// Beats put on the bus.
    pub beats_issued: u64,
    /// Burst responses matched to an outstanding burst.
    pub responses: u64,
    /// Matched responses with a non-OK code.
    pub bus_errors: u64,
    /// Late responses to abandoned bursts, discarded.
    pub abandoned_responses: u64,
    /// Responses with an unknown tag, discarded.
    pub stray_responses: u64,
    /// Largest number of bursts in flight at once.
    pub peak_outstanding: u64,
}

/// Snapshot of a driver, for logs and for the Python `report()` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Device state at the time of the snapshot.
    pub state: DeviceState,
    /// Cycles since the last reset.
    pub cycles: u64,
    /// Whether the core stopped on a fault.
    pub fault: bool,
    /// Bus counters.
    pub stats: BusStats,
}

impl Report {
    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` errors (none are expected for this type).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders a human-readable block.
    pub fn summary(&self) -> String {
        let s = &self.stats;
        let mut out = String::new();
        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "BUS DRIVER REPORT");
        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "state                    {}", self.state);
        let _ = writeln!(out, "cycles                   {}", self.cycles);
        let _ = writeln!(out, "fault                    {}", self.fault);
        let _ = writeln!(out, "----------------------------------------------------------");
        let _ = writeln!(
            out,
            "requests                 {} read, {} written",
            s.requests_read, s.requests_written
        );
        let _ = writeln!(
            out,
            "bytes                    {} read, {} written",
            s.bytes_read, s.bytes_written
        );
        let avg_beats = if s.bursts_issued == 0 {
            0.0
        } else {
            s.beats_issued as f64 / s.bursts_issued as f64
        };
        let _ = writeln!(
            out,
            "bursts                   {} ({} beats, {:.2} avg)",
            s.bursts_issued, s.beats_issued, avg_beats
        );
        let _ = writeln!(
            out,
            "responses                {} ({} bus errors)",
            s.responses, s.bus_errors
        );
        let _ = writeln!(
            out,
            "discarded                {} abandoned, {} stray",
            s.abandoned_responses, s.stray_responses
        );
        let _ = writeln!(out, "peak outstanding         {}", s.peak_outstanding);
        out
    }
}
