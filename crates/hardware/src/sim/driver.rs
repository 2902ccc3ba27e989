//! Bus-transaction driver.
//!
//! `Driver` is the entry point a verification scenario holds. It owns one device and the
//! whole transaction path to it:
//! 1. **Memory access:** `read`/`write` of any length and alignment go through the codec
//!    (split), the scheduler (issue, drain) and back through the codec (reassemble).
//! 2. **Images:** Load an ELF file or any `ImageResolver` through the image loader.
//! 3. **Execution:** Run, step, wait for WFI or halt, raise interrupts and reset, all
//!    delegated to the execution controller.
//! 4. **Reporting:** Cycle count, register readback, bus statistics.
//!
//! A driver is single-threaded. Independent scenarios each build their own driver and may
//! run on separate threads.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use super::image::{ElfImage, ImageResolver};
use super::loader::ImageLoader;
use super::payload::HostBuffer;
use crate::bus::{Codec, Completion, Scheduler, TransactionKind, TransactionRequest};
use crate::common::{BusAddr, Precondition, Result};
use crate::config::{Config, RegionKind};
use crate::core::{DeviceState, ExecutionController, Hart, WaitCondition};
use crate::soc::System;
use crate::soc::devices::csr::PC_START_LO;
use crate::soc::region::MemoryMap;
use crate::stats::{BusStats, Report};

/// Drives one device over its TCM bus interface.
#[derive(Debug)]
pub struct Driver<H> {
    config: Config,
    map: MemoryMap,
    codec: Codec,
    scheduler: Scheduler,
    controller: ExecutionController<H>,
}

impl<H: Hart> Driver<H> {
    /// Builds the device described by `config` around `hart`, held in reset.
    ///
    /// # Errors
    ///
    /// `DriverError::Config` if the configuration does not validate.
    pub fn new(config: Config, hart: H) -> Result<Self> {
        let map = MemoryMap::from_config(&config)?;
        let codec = Codec::new(&config.system);
        let scheduler = Scheduler::new(&config.system, config.general.trace_transactions);
        let controller = ExecutionController::new(System::new(&config, hart));
        info!(
            regions = map.regions().len(),
            bus_width = config.system.bus_width,
            depth = config.system.pipeline_depth,
            "driver ready"
        );
        Ok(Self {
            config,
            map,
            codec,
            scheduler,
            controller,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Memory map derived from the configuration.
    pub const fn memory_map(&self) -> &MemoryMap {
        &self.map
    }

    /// Execution controller.
    pub const fn controller(&self) -> &ExecutionController<H> {
        &self.controller
    }

    /// Mutable execution controller, for direct device access in tests.
    pub fn controller_mut(&mut self) -> &mut ExecutionController<H> {
        &mut self.controller
    }

    /// Core-under-test model.
    pub const fn hart(&self) -> &H {
        self.controller.hart()
    }

    // ══════════════════════════════════════════════════════════
    // Memory access
    // ══════════════════════════════════════════════════════════

    /// Reads `len` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// A `Precondition` for zero length, unmapped or region-crossing ranges, or access
    /// during reset; `BusResponse` if any burst fails; `ResponseTimeout` if the device
    /// stops answering.
    pub fn read(&mut self, addr: u64, len: u64) -> Result<Vec<u8>> {
        let request = TransactionRequest::read(BusAddr(addr), len);
        self.transact(&request, false).map(Completion::into_bytes)
    }

    /// Writes `data` at `addr`.
    ///
    /// # Errors
    ///
    /// As for [`Driver::read`].
    pub fn write(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        let request = TransactionRequest::write(BusAddr(addr), data);
        self.transact(&request, false).map(drop)
    }

    /// Writes a host value handed over a language boundary.
    ///
    /// # Errors
    ///
    /// `Precondition::NotAByteBuffer` (with nothing issued on the bus) unless `payload` is a
    /// contiguous buffer; otherwise as for [`Driver::write`].
    pub fn write_host(&mut self, addr: u64, payload: HostBuffer<'_>) -> Result<()> {
        let bytes = payload.as_bytes()?;
        self.write(addr, bytes)
    }

    /// Writes one little-endian 32-bit word.
    ///
    /// # Errors
    ///
    /// As for [`Driver::write`].
    pub fn write_word(&mut self, addr: u64, value: u32) -> Result<()> {
        self.write(addr, &value.to_le_bytes())
    }

    /// Reads one little-endian 32-bit word.
    ///
    /// # Errors
    ///
    /// As for [`Driver::read`].
    pub fn read_word(&mut self, addr: u64) -> Result<u32> {
        let bytes = self.read(addr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes);
        Ok(u32::from_le_bytes(word))
    }

    /// Segment write used by the image loader; allowed while the device is in reset.
    pub(crate) fn write_segment(&mut self, addr: BusAddr, data: &[u8]) -> Result<()> {
        let request = TransactionRequest::write(addr, data);
        self.transact(&request, true).map(drop)
    }

    fn transact(
        &mut self,
        request: &TransactionRequest<'_>,
        during_reset: bool,
    ) -> Result<Completion> {
        if !during_reset {
            self.controller.ensure_bus_access(request.addr)?;
        }
        let bursts = self.codec.split(&self.map, request)?;

        for descriptor in &bursts {
            let data = match request.kind {
                TransactionKind::Write => Codec::pack_write(request, descriptor),
                TransactionKind::Read => Vec::new(),
            };
            let _ = self
                .scheduler
                .issue(&mut self.controller, request.kind, *descriptor, data)?;
        }
        let responses = self.scheduler.drain(&mut self.controller)?;
        let completion = Codec::reassemble(request, &responses)?;

        let stats = self.scheduler.stats_mut();
        match request.kind {
            TransactionKind::Read => {
                stats.requests_read += 1;
                stats.bytes_read += request.len;
            }
            TransactionKind::Write => {
                stats.requests_written += 1;
                stats.bytes_written += request.len;
            }
        }
        Ok(completion)
    }

    // ══════════════════════════════════════════════════════════
    // Images
    // ══════════════════════════════════════════════════════════

    /// Loads every segment of `image` and records the entry point.
    ///
    /// # Arguments
    ///
    /// * `image` - Resolved image.
    /// * `entry_point` - Overrides the image's own entry point.
    ///
    /// # Returns
    ///
    /// The entry point recorded.
    ///
    /// # Errors
    ///
    /// See [`ImageLoader::load`].
    pub fn load_image(
        &mut self,
        image: &dyn ImageResolver,
        entry_point: Option<u64>,
    ) -> Result<u64> {
        let entry = entry_point.unwrap_or_else(|| image.entry_point());
        let _ = ImageLoader::load(self, entry, &image.segments())?;
        Ok(entry)
    }

    /// Loads the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// Image read or parse errors, then as for [`Driver::load_image`].
    pub fn load_program(
        &mut self,
        path: impl AsRef<Path>,
        entry_point: Option<u64>,
    ) -> Result<u64> {
        let image = ElfImage::open(path)?;
        self.load_image(&image, entry_point)
    }

    /// Resolves `names` in the ELF file at `path`, then loads it.
    ///
    /// # Returns
    ///
    /// Address of every requested symbol.
    ///
    /// # Errors
    ///
    /// `Precondition::UnresolvedSymbol` (before anything is written) if a name resolves
    /// to 0; otherwise as for [`Driver::load_program`].
    pub fn load_elf_and_lookup_symbols(
        &mut self,
        path: impl AsRef<Path>,
        names: &[&str],
    ) -> Result<BTreeMap<String, u64>> {
        let image = ElfImage::open(path)?;
        let symbols = image.resolve_symbols(names);
        if let Some((name, _)) = symbols.iter().find(|&(_, &addr)| addr == 0) {
            return Err(Precondition::UnresolvedSymbol(name.clone()).into());
        }
        let _ = self.load_image(&image, None)?;
        Ok(symbols)
    }

    // ══════════════════════════════════════════════════════════
    // Execution
    // ══════════════════════════════════════════════════════════

    /// Releases the core at the recorded entry point (or `PC_START`).
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` unless the device is `Loaded`.
    pub fn run(&mut self) -> Result<()> {
        self.controller.start()
    }

    /// Starts execution at `entry_point`.
    ///
    /// With a CSR block mapped, `PC_START` is written over the bus first. The entry point
    /// is recorded either way.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` unless the device is `Loaded`; bus errors from the
    /// register write.
    pub fn execute_from(&mut self, entry_point: u64) -> Result<()> {
        if self.controller.state() != DeviceState::Loaded {
            return Err(Precondition::InvalidState {
                operation: "run",
                state: self.controller.state(),
            }
            .into());
        }
        let csr_base = self
            .map
            .regions()
            .iter()
            .find(|r| r.kind == RegionKind::Csr)
            .map(|r| r.base.val());
        if let Some(base) = csr_base {
            self.write(base + PC_START_LO, &entry_point.to_le_bytes())?;
        }
        self.controller.mark_loaded(entry_point)?;
        self.run()
    }

    /// Waits for the core to halt, within the configured default budget.
    ///
    /// # Errors
    ///
    /// `DriverError::Timeout` if the core does not halt in time.
    pub fn wait(&mut self) -> Result<u64> {
        self.wait_for(WaitCondition::Halted, self.config.general.wait_timeout_cycles)
    }

    /// Advances the clock until `condition` holds or `timeout_cycles` pass.
    ///
    /// On timeout any in-flight bursts are abandoned.
    ///
    /// # Errors
    ///
    /// `DriverError::Timeout` once the budget is spent.
    pub fn wait_for(&mut self, condition: WaitCondition, timeout_cycles: u64) -> Result<u64> {
        let result = self.controller.wait_for(condition, timeout_cycles);
        if result.is_err() {
            let _ = self.scheduler.abandon_outstanding();
        }
        result
    }

    /// Waits for the core to execute WFI.
    ///
    /// # Errors
    ///
    /// `DriverError::Timeout` if it does not within `timeout_cycles`.
    pub fn wait_for_wfi(&mut self, timeout_cycles: u64) -> Result<u64> {
        self.wait_for(WaitCondition::WaitForInterrupt, timeout_cycles)
    }

    /// Waits for the core to halt.
    ///
    /// # Errors
    ///
    /// `DriverError::Timeout` if it does not within `timeout_cycles`.
    pub fn wait_for_halted(&mut self, timeout_cycles: u64) -> Result<u64> {
        self.wait_for(WaitCondition::Halted, timeout_cycles)
    }

    /// Starts the core and waits for it to halt.
    ///
    /// # Returns
    ///
    /// Cycles spent waiting.
    ///
    /// # Errors
    ///
    /// As for [`Driver::run`] and [`Driver::wait_for_halted`].
    pub fn run_to_halt(&mut self, timeout_cycles: u64) -> Result<u64> {
        self.run()?;
        self.wait_for_halted(timeout_cycles)
    }

    /// Advances up to `n` cycles; see [`ExecutionController::step`].
    pub fn step(&mut self, n: u64) -> u64 {
        self.controller.step(n)
    }

    /// Raises the core's interrupt line.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` unless running or waiting for an interrupt.
    pub fn raise_interrupt(&mut self) -> Result<()> {
        self.controller.raise_interrupt()
    }

    /// Returns the device to reset, zeroing the cycle counter and abandoning any
    /// in-flight bursts.
    pub fn reset(&mut self) {
        self.scheduler.reset(&mut self.controller);
    }

    // ══════════════════════════════════════════════════════════
    // Observation
    // ══════════════════════════════════════════════════════════

    /// Cycles since the last reset.
    pub const fn cycle_count(&self) -> u64 {
        self.controller.cycles()
    }

    /// Current device state.
    pub const fn state(&self) -> DeviceState {
        self.controller.state()
    }

    /// Returns `true` if the core stopped on a fault.
    pub const fn fault(&self) -> bool {
        self.controller.fault()
    }

    /// Reads a core register, formatted as `0x`-prefixed hex.
    ///
    /// # Errors
    ///
    /// `Precondition::UnknownRegister` if the core does not expose `name`.
    pub fn read_register(&self, name: &str) -> Result<String> {
        let value = self.controller.read_register(name)?;
        Ok(format!("{value:#x}"))
    }

    /// Bus counters.
    pub const fn stats(&self) -> &BusStats {
        self.scheduler.stats()
    }

    /// Snapshot of state, cycles and counters.
    pub fn report(&self) -> Report {
        Report {
            state: self.state(),
            cycles: self.cycle_count(),
            fault: self.fault(),
            stats: self.stats().clone(),
        }
    }
}
