//! Memory map: named, non-overlapping address regions.
//!
//! The map is the driver-side view of the bus address space. The codec uses it to
//! reject requests that fall outside every region or run past the end of one before
//! anything is issued.

use crate::common::{BusAddr, DriverError, Precondition, Result};
use crate::config::{Config, RegionKind};

/// One fixed partition of the bus address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    /// Region name (e.g. `"dtcm"`).
    pub name: String,
    /// Device behind the region.
    pub kind: RegionKind,
    /// First address.
    pub base: BusAddr,
    /// Size in bytes.
    pub size: u64,
    /// Access latency in cycles.
    pub latency: u64,
}

impl Region {
    /// Address one past the last byte.
    pub const fn end(&self) -> BusAddr {
        BusAddr(self.base.0 + self.size)
    }

    /// Returns `true` if `addr` falls inside the region.
    pub const fn contains(&self, addr: BusAddr) -> bool {
        addr.0 >= self.base.0 && addr.0 < self.base.0 + self.size
    }

    /// Returns `true` if all of `[addr, addr + len)` falls inside the region.
    pub const fn contains_range(&self, addr: BusAddr, len: u64) -> bool {
        match addr.0.checked_add(len) {
            Some(end) => self.contains(addr) && end <= self.base.0 + self.size,
            None => false,
        }
    }
}

/// Sorted collection of regions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryMap {
    regions: Vec<Region>,
}

impl MemoryMap {
    /// Builds the map from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` if the configuration does not validate.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut regions: Vec<Region> = config
            .memory
            .regions
            .iter()
            .map(|r| Region {
                name: r.name.clone(),
                kind: r.kind,
                base: BusAddr(r.base),
                size: r.size,
                latency: r.latency,
            })
            .collect();
        regions.sort_by_key(|r| r.base);
        if regions.is_empty() {
            return Err(DriverError::Config("memory map has no regions".into()));
        }
        Ok(Self { regions })
    }

    /// All regions in ascending address order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns the region containing `addr`.
    pub fn find(&self, addr: BusAddr) -> Option<&Region> {
        let idx = self.regions.partition_point(|r| r.end() <= addr);
        self.regions.get(idx).filter(|r| r.contains(addr))
    }

    /// Returns the region by name.
    pub fn by_name(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Returns the single region that holds all of `[addr, addr + len)`.
    ///
    /// # Errors
    ///
    /// `Precondition::Unmapped` if `addr` is outside every region, or
    /// `Precondition::CrossesRegion` if the range runs past the end of its region.
    pub fn locate(&self, addr: BusAddr, len: u64) -> std::result::Result<&Region, Precondition> {
        let region = self.find(addr).ok_or(Precondition::Unmapped { addr, len })?;
        if region.contains_range(addr, len) {
            Ok(region)
        } else {
            Err(Precondition::CrossesRegion {
                addr,
                len,
                region: region.name.clone(),
            })
        }
    }
}
