//! Bus-transaction driver for core verification.
//!
//! This crate drives a core-under-test over its tightly-coupled-memory bus interface:
//! 1. **Bus:** Splits arbitrary reads and writes into legal bursts, pipelines them with tag
//!    matching, and reassembles the results.
//! 2. **Core:** Cycle clock, run-state machine (reset, loaded, running, WFI, halted) and the
//!    `Hart` trait the core-under-test model implements.
//! 3. **SoC:** Device-side model: interconnect, TCM banks and the CSR block.
//! 4. **Simulation:** The `Driver` front end, ELF loading and host-buffer checks.
//! 5. **Configuration and statistics:** JSON-deserializable config and bus counters.

/// Burst descriptors, codec and scheduler.
pub mod bus;
/// Common types (bus addresses, errors).
pub mod common;
/// Driver configuration (defaults, bus geometry, memory map).
pub mod config;
/// Clock, run-state machine and core-under-test model.
pub mod core;
/// Driver front end, image loading and host payloads.
pub mod sim;
/// Device-side bus model (interconnect, TCM, CSRs, memory map).
pub mod soc;
/// Bus statistics and reports.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Error type returned by every fallible operation.
pub use crate::common::DriverError;
/// Main driver type; owns one device and the transaction path to it.
pub use crate::sim::Driver;
