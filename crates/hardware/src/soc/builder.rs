//! Device construction and the top-level `System` type.
//!
//! This module builds the simulated device from configuration. It performs:
//! 1. **Bus setup:** Creates an empty interconnect.
//! 2. **Target registration:** Instantiates a `TcmBank` for every TCM region and a `CsrBlock`
//!    for every CSR region, each with the region's latency.
//! 3. **Core attachment:** Pairs the bus with the core-under-test model.

use tracing::debug;

use crate::config::{Config, RegionKind};
use crate::core::Hart;
use crate::soc::devices::CsrBlock;
use crate::soc::interconnect::Interconnect;
use crate::soc::memory::TcmBank;

/// The simulated device: the bus with its targets and the core attached to it.
#[derive(Debug)]
pub struct System<H> {
    /// Interconnect routing bursts and core accesses to TCM and CSRs.
    pub bus: Interconnect,
    /// Core-under-test model.
    pub hart: H,
}

impl<H: Hart> System<H> {
    /// Builds the device described by `config`.
    ///
    /// The configuration is expected to be validated already.
    ///
    /// # Arguments
    ///
    /// * `config` - Driver configuration (memory regions and latencies).
    /// * `hart` - Core-under-test model.
    pub fn new(config: &Config, hart: H) -> Self {
        let mut bus = Interconnect::new();
        for region in &config.memory.regions {
            debug!(
                name = %region.name,
                base = region.base,
                size = region.size,
                "map {:?} region",
                region.kind
            );
            match region.kind {
                RegionKind::Tcm => bus.add_target(Box::new(TcmBank::new(
                    region.name.clone(),
                    region.base,
                    region.size as usize,
                    region.latency,
                ))),
                RegionKind::Csr => bus.add_target(Box::new(CsrBlock::new(
                    region.name.clone(),
                    region.base,
                    region.size,
                    region.latency,
                ))),
            }
        }
        Self { bus, hart }
    }
}
