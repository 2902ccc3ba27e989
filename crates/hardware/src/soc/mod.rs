//! Device-side model.
//!
//! This module organizes the components that stand in for the hardware behind the bus:
//! the memory map, the interconnect, TCM banks, the CSR block, and the builder that
//! assembles them with a core-under-test model.

/// Device construction.
pub mod builder;

/// Memory-mapped devices other than TCM.
pub mod devices;

/// Interconnect routing and completion timing.
pub mod interconnect;

/// Tightly-coupled memory banks.
pub mod memory;

/// Named address regions and lookup.
pub mod region;

/// Bus target and core port traits.
pub mod traits;

pub use builder::System;
