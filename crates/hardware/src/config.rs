//! Configuration system for the bus-transaction driver.
//!
//! This module defines all configuration structures used to parameterize the driver
//! and the device-side bus model. It provides:
//! 1. **Defaults:** Baseline bus geometry, pipeline depth, timeouts and the TCM memory map.
//! 2. **Structures:** Hierarchical config for general, system (bus) and memory (regions) settings.
//! 3. **Validation:** Rejects impossible bus widths and overlapping or misaligned regions.
//!
//! Configuration is supplied as JSON from the Python bindings or built with `Config::default()`.

use serde::{Deserialize, Serialize};

use crate::common::{DriverError, Result};

/// Default configuration constants.
mod defaults {
    /// Bus data width in bytes (128-bit AXI data bus).
    pub const BUS_WIDTH: u64 = 16;

    /// Maximum beats per burst.
    pub const MAX_BURST_BEATS: u64 = 16;

    /// Address boundary no burst may cross (AXI 4 KiB rule).
    pub const BURST_BOUNDARY: u64 = 4096;

    /// Outstanding bursts allowed before issuance stalls.
    pub const PIPELINE_DEPTH: usize = 4;

    /// Cycles to wait for a single burst response before abandoning.
    pub const RESPONSE_TIMEOUT_CYCLES: u64 = 10_000;

    /// Cycle budget for `Driver::wait` and `Driver::run_to_halt` without explicit timeout.
    pub const WAIT_TIMEOUT_CYCLES: u64 = 1_000_000;

    /// Instruction TCM base address.
    pub const ITCM_BASE: u64 = 0x0000_0000;

    /// Instruction TCM size (512 KiB).
    pub const ITCM_SIZE: u64 = 0x8_0000;

    /// Data TCM base address.
    pub const DTCM_BASE: u64 = 0x0010_0000;

    /// Data TCM size (512 KiB).
    pub const DTCM_SIZE: u64 = 0x8_0000;

    /// Control/status register block base address.
    pub const CSR_BASE: u64 = 0x0020_0000;

    /// Control/status register block size.
    pub const CSR_SIZE: u64 = 0x1000;

    /// Access latency of a TCM bank in cycles.
    pub const TCM_LATENCY: u64 = 2;

    /// Access latency of the CSR block in cycles.
    pub const CSR_LATENCY: u64 = 1;
}

/// Largest bus width whose byte strobes fit in a `u64` mask.
pub const MAX_BUS_WIDTH: u64 = 64;

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use tcmbus_core::config::{Config, RegionKind};
///
/// let json = r#"{
///     "system": { "bus_width": 8, "pipeline_depth": 2 },
///     "memory": {
///         "regions": [
///             { "name": "tcm", "kind": "Tcm", "base": 0, "size": 65536 }
///         ]
///     }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.system.bus_width, 8);
/// assert_eq!(config.system.max_burst_beats, 16);
/// assert_eq!(config.memory.regions[0].kind, RegionKind::Tcm);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// General driver settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Bus geometry and scheduler parameters.
    #[serde(default)]
    pub system: SystemConfig,
    /// Memory map.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` if the JSON is malformed or the result fails
    /// [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the bus geometry is legal and the regions form a proper partition.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let sys = &self.system;
        if !sys.bus_width.is_power_of_two() || sys.bus_width > MAX_BUS_WIDTH {
            return Err(DriverError::Config(format!(
                "bus_width must be a power of two no larger than {MAX_BUS_WIDTH}, got {}",
                sys.bus_width
            )));
        }
        if sys.max_burst_beats == 0 {
            return Err(DriverError::Config("max_burst_beats must be at least 1".into()));
        }
        if !sys.burst_boundary.is_power_of_two() || sys.burst_boundary < sys.bus_width {
            return Err(DriverError::Config(format!(
                "burst_boundary must be a power of two of at least one beat, got {}",
                sys.burst_boundary
            )));
        }
        if sys.pipeline_depth == 0 {
            return Err(DriverError::Config("pipeline_depth must be at least 1".into()));
        }
        if self.memory.regions.is_empty() {
            return Err(DriverError::Config("memory map has no regions".into()));
        }

        for region in &self.memory.regions {
            if region.size == 0 {
                return Err(DriverError::Config(format!("region `{}` is empty", region.name)));
            }
            if region.base % sys.bus_width != 0 || region.size % sys.bus_width != 0 {
                return Err(DriverError::Config(format!(
                    "region `{}` is not aligned to the {}-byte bus width",
                    region.name, sys.bus_width
                )));
            }
            if region.base.checked_add(region.size).is_none() {
                return Err(DriverError::Config(format!(
                    "region `{}` wraps the address space",
                    region.name
                )));
            }
        }

        let mut sorted: Vec<&RegionConfig> = self.memory.regions.iter().collect();
        sorted.sort_by_key(|r| r.base);
        for pair in sorted.windows(2) {
            if pair[0].base + pair[0].size > pair[1].base {
                return Err(DriverError::Config(format!(
                    "regions `{}` and `{}` overlap",
                    pair[0].name, pair[1].name
                )));
            }
        }
        Ok(())
    }
}

/// General driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Cycle budget used by `wait()` when no explicit timeout is given.
    #[serde(default = "GeneralConfig::default_wait_timeout")]
    pub wait_timeout_cycles: u64,

    /// Log every burst issue/complete at `trace` level.
    #[serde(default)]
    pub trace_transactions: bool,
}

impl GeneralConfig {
    fn default_wait_timeout() -> u64 {
        defaults::WAIT_TIMEOUT_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            wait_timeout_cycles: defaults::WAIT_TIMEOUT_CYCLES,
            trace_transactions: false,
        }
    }
}

/// Bus geometry and scheduler parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SystemConfig {
    /// Bus data width in bytes (one beat).
    #[serde(default = "SystemConfig::default_bus_width")]
    pub bus_width: u64,

    /// Maximum beats in a single burst.
    #[serde(default = "SystemConfig::default_max_burst_beats")]
    pub max_burst_beats: u64,

    /// Address boundary (bytes, power of two) that no burst may cross.
    #[serde(default = "SystemConfig::default_burst_boundary")]
    pub burst_boundary: u64,

    /// Maximum outstanding bursts.
    #[serde(default = "SystemConfig::default_pipeline_depth")]
    pub pipeline_depth: usize,

    /// Cycles to wait for any single burst response.
    #[serde(default = "SystemConfig::default_response_timeout")]
    pub response_timeout_cycles: u64,
}

impl SystemConfig {
    fn default_bus_width() -> u64 {
        defaults::BUS_WIDTH
    }

    fn default_max_burst_beats() -> u64 {
        defaults::MAX_BURST_BEATS
    }

    fn default_burst_boundary() -> u64 {
        defaults::BURST_BOUNDARY
    }

    fn default_pipeline_depth() -> usize {
        defaults::PIPELINE_DEPTH
    }

    fn default_response_timeout() -> u64 {
        defaults::RESPONSE_TIMEOUT_CYCLES
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bus_width: defaults::BUS_WIDTH,
            max_burst_beats: defaults::MAX_BURST_BEATS,
            burst_boundary: defaults::BURST_BOUNDARY,
            pipeline_depth: defaults::PIPELINE_DEPTH,
            response_timeout_cycles: defaults::RESPONSE_TIMEOUT_CYCLES,
        }
    }
}

/// What sits behind a region on the device side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum RegionKind {
    /// Tightly-coupled memory bank (plain read/write storage).
    #[serde(alias = "TCM")]
    Tcm,
    /// Control/status register block.
    #[serde(alias = "CSR")]
    Csr,
}

/// One entry of the memory map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegionConfig {
    /// Human-readable name (e.g. `"itcm"`).
    pub name: String,
    /// Device behind the region.
    pub kind: RegionKind,
    /// Base bus address.
    pub base: u64,
    /// Size in bytes.
    pub size: u64,
    /// Access latency in cycles (excluding per-beat transfer time).
    #[serde(default = "RegionConfig::default_latency")]
    pub latency: u64,
}

impl RegionConfig {
    fn default_latency() -> u64 {
        defaults::TCM_LATENCY
    }
}

/// Memory map configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Non-overlapping regions making up the bus address space.
    #[serde(default = "MemoryConfig::default_regions")]
    pub regions: Vec<RegionConfig>,
}

impl MemoryConfig {
    fn default_regions() -> Vec<RegionConfig> {
        vec![
            RegionConfig {
                name: "itcm".into(),
                kind: RegionKind::Tcm,
                base: defaults::ITCM_BASE,
                size: defaults::ITCM_SIZE,
                latency: defaults::TCM_LATENCY,
            },
            RegionConfig {
                name: "dtcm".into(),
                kind: RegionKind::Tcm,
                base: defaults::DTCM_BASE,
                size: defaults::DTCM_SIZE,
                latency: defaults::TCM_LATENCY,
            },
            RegionConfig {
                name: "csr".into(),
                kind: RegionKind::Csr,
                base: defaults::CSR_BASE,
                size: defaults::CSR_SIZE,
                latency: defaults::CSR_LATENCY,
            },
        ]
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            regions: Self::default_regions(),
        }
    }
}
