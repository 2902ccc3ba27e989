//! Execution controller.
//!
//! This module owns the device run-state machine and the cycle loop. It provides:
//! 1. **Cycle:** One clock edge. Ticks the bus, then the core if it is running, then mirrors
//!    the run state into the CSR block.
//! 2. **Lifecycle commands:** Load, start, interrupt and reset, each checked against the
//!    current state.
//! 3. **Blocking waits:** `step` and `wait_for` advance the clock until a cycle count or a
//!    hardware condition is reached. Both always terminate.
//!
//! State transitions:
//!
//! ```text
//! Reset --load--> Loaded --start--> Running --wfi--> WaitingForInterrupt
//!                   ^  |               |   <--irq--
//!                   +--+               +--halt/fault--> Halted
//! any --reset--> Reset
//! ```

use tracing::{debug, info, warn};

use super::clock::Clock;
use super::hart::{Hart, HartSignal};
use super::state::{DeviceState, WaitCondition};
use crate::common::{BusAddr, DriverError, Precondition, Result};
use crate::soc::System;
use crate::soc::devices::csr::{STATUS_FAULT, STATUS_HALTED, STATUS_WFI};
use crate::soc::interconnect::Interconnect;

/// Run-state machine driving one device.
#[derive(Debug)]
pub struct ExecutionController<H> {
    system: System<H>,
    clock: Clock,
    state: DeviceState,
    entry_point: Option<u64>,
    fault: bool,
}

impl<H: Hart> ExecutionController<H> {
    /// Wraps a freshly built device, held in reset.
    pub fn new(system: System<H>) -> Self {
        Self {
            system,
            clock: Clock::new(),
            state: DeviceState::Reset,
            entry_point: None,
            fault: false,
        }
    }

    /// Current run state.
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    /// Cycles elapsed since the last reset.
    pub const fn cycles(&self) -> u64 {
        self.clock.cycles()
    }

    /// Returns `true` if the core stopped on a fault. Cleared by reset.
    pub const fn fault(&self) -> bool {
        self.fault
    }

    /// Entry point recorded by the last load.
    pub const fn entry_point(&self) -> Option<u64> {
        self.entry_point
    }

    /// The device-side bus.
    pub fn bus_mut(&mut self) -> &mut Interconnect {
        &mut self.system.bus
    }

    /// The core-under-test model.
    pub const fn hart(&self) -> &H {
        &self.system.hart
    }

    /// Advances the device by one clock cycle.
    pub fn cycle(&mut self) {
        let now = self.clock.tick();
        let System { bus, hart } = &mut self.system;
        bus.tick(now);
        if self.state == DeviceState::Running {
            let signal = hart.tick(bus);
            self.observe(signal);
        }
        self.sync_status();
    }

    fn observe(&mut self, signal: HartSignal) {
        let next = match signal {
            HartSignal::Running => return,
            HartSignal::WaitForInterrupt => DeviceState::WaitingForInterrupt,
            HartSignal::Halted => DeviceState::Halted,
            HartSignal::Fault => {
                self.fault = true;
                warn!(cycle = self.clock.cycles(), "core reported a fault");
                DeviceState::Halted
            }
        };
        if next == DeviceState::Halted {
            info!(cycle = self.clock.cycles(), fault = self.fault, "core halted");
        } else {
            debug!(cycle = self.clock.cycles(), "{} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn sync_status(&mut self) {
        let mut bits = 0;
        if self.state == DeviceState::Halted {
            bits |= STATUS_HALTED;
        }
        if self.fault {
            bits |= STATUS_FAULT;
        }
        if self.state == DeviceState::WaitingForInterrupt {
            bits |= STATUS_WFI;
        }
        if let Some(csr) = self.system.bus.csr_mut() {
            csr.set_status(bits);
        }
    }

    /// Advances up to `n` cycles, stopping early on the cycle the core halts.
    ///
    /// # Returns
    ///
    /// Cycles actually advanced: `n`, or fewer if the core halted (the halting cycle
    /// included). Returns 0 without advancing if the device is already halted.
    pub fn step(&mut self, n: u64) -> u64 {
        if self.state == DeviceState::Halted {
            return 0;
        }
        for i in 0..n {
            self.cycle();
            if self.state == DeviceState::Halted {
                return i + 1;
            }
        }
        n
    }

    /// Advances the clock until `condition` holds or `timeout_cycles` have elapsed.
    ///
    /// # Returns
    ///
    /// Cycles advanced; 0 if the condition already held.
    ///
    /// # Errors
    ///
    /// `DriverError::Timeout` once the budget is spent.
    pub fn wait_for(&mut self, condition: WaitCondition, timeout_cycles: u64) -> Result<u64> {
        let mut elapsed = 0;
        while !condition.holds(self.state) {
            if elapsed == timeout_cycles {
                warn!(%condition, cycles = timeout_cycles, state = %self.state, "wait timed out");
                return Err(DriverError::Timeout {
                    condition,
                    cycles: timeout_cycles,
                });
            }
            self.cycle();
            elapsed += 1;
        }
        debug!(%condition, elapsed, "wait satisfied");
        Ok(elapsed)
    }

    /// Records a completed load. Legal in `Reset` and `Loaded`.
    ///
    /// Programs the entry point into `PC_START` when a CSR block is mapped.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` in any other state.
    pub fn mark_loaded(&mut self, entry_point: u64) -> Result<()> {
        self.ensure_loadable()?;
        self.entry_point = Some(entry_point);
        if let Some(csr) = self.system.bus.csr_mut() {
            csr.set_pc_start(entry_point);
        }
        self.state = DeviceState::Loaded;
        debug!(entry = format_args!("{entry_point:#x}"), "device loaded");
        Ok(())
    }

    /// Fails unless an image may be loaded in the current state.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` outside `Reset` and `Loaded`.
    pub fn ensure_loadable(&self) -> Result<()> {
        match self.state {
            DeviceState::Reset | DeviceState::Loaded => Ok(()),
            state => Err(Precondition::InvalidState {
                operation: "load an image",
                state,
            }
            .into()),
        }
    }

    /// Releases the core. Legal only in `Loaded`.
    ///
    /// The start PC is taken from `PC_START` when a CSR block is mapped, so a test can
    /// redirect execution by writing that register over the bus.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` in any other state.
    pub fn start(&mut self) -> Result<()> {
        if self.state != DeviceState::Loaded {
            return Err(Precondition::InvalidState {
                operation: "run",
                state: self.state,
            }
            .into());
        }
        let pc = match self.system.bus.csr_mut() {
            Some(csr) => csr.pc_start(),
            None => self.entry_point.unwrap_or_default(),
        };
        self.system.hart.release(pc);
        self.state = DeviceState::Running;
        info!(pc = format_args!("{pc:#x}"), cycle = self.clock.cycles(), "core released");
        Ok(())
    }

    /// Raises the core's interrupt line.
    ///
    /// From `WaitingForInterrupt` the device returns to `Running`. While `Running` the
    /// interrupt is delivered without a state change.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` in any other state.
    pub fn raise_interrupt(&mut self) -> Result<()> {
        match self.state {
            DeviceState::WaitingForInterrupt | DeviceState::Running => {
                self.system.hart.raise_interrupt();
                if self.state == DeviceState::WaitingForInterrupt {
                    debug!(cycle = self.clock.cycles(), "interrupt wakes core");
                }
                self.state = DeviceState::Running;
                self.sync_status();
                Ok(())
            }
            state => Err(Precondition::InvalidState {
                operation: "raise an interrupt",
                state,
            }
            .into()),
        }
    }

    /// Returns the device to `Reset` and zeroes the cycle counter.
    ///
    /// Bursts accepted by the interconnect but not yet completed are dropped, so no
    /// write issued before the reset can land after it.
    pub fn reset(&mut self) {
        let aborted = self.system.bus.abort_in_flight();
        info!(cycle = self.clock.cycles(), from = %self.state, aborted, "device reset");
        self.clock.reset();
        self.system.hart.reset();
        self.state = DeviceState::Reset;
        self.entry_point = None;
        self.fault = false;
        if let Some(csr) = self.system.bus.csr_mut() {
            csr.reset();
        }
    }

    /// Fails if a bus access to `addr` is not allowed in the current state.
    ///
    /// # Errors
    ///
    /// `Precondition::DeviceInReset` while in `Reset`.
    pub fn ensure_bus_access(&self, addr: BusAddr) -> std::result::Result<(), Precondition> {
        if self.state == DeviceState::Reset {
            Err(Precondition::DeviceInReset(addr))
        } else {
            Ok(())
        }
    }

    /// Reads a core register by name.
    ///
    /// # Errors
    ///
    /// `Precondition::UnknownRegister` if the core does not expose `name`.
    pub fn read_register(&self, name: &str) -> Result<u64> {
        self.system
            .hart
            .register(name)
            .ok_or_else(|| Precondition::UnknownRegister(name.to_owned()).into())
    }
}
