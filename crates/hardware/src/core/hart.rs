//! Core-under-test model.
//!
//! The driver does not simulate instructions. It drives whatever sits behind the `Hart`
//! trait one cycle at a time and reacts to the signal the core reports:
//! 1. **`Hart`:** Reset, release at a PC, per-cycle tick with access to TCM, interrupt input,
//!    and named register readback.
//! 2. **`ScriptedHart`:** A timeline of signals and stores at fixed executed-cycle offsets, used
//!    to exercise the run-state machine without a real core.

use crate::common::BusAddr;
use crate::soc::traits::MemoryPort;

/// What the core reported at the end of a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HartSignal {
    /// Still executing.
    Running,
    /// Executed WFI; stops until an interrupt is raised.
    WaitForInterrupt,
    /// Halted normally.
    Halted,
    /// Stopped on an unrecoverable fault (e.g. a store the bus refused).
    Fault,
}

/// A core-under-test attached to the device.
///
/// Implementations must be `Send + Sync` so that scenarios can run on their own threads.
pub trait Hart: Send + Sync {
    /// Returns the core to its power-on state.
    fn reset(&mut self);

    /// Releases the core from reset, starting execution at `pc`.
    fn release(&mut self, pc: u64);

    /// Executes one cycle. Only called while the device is running.
    ///
    /// # Arguments
    ///
    /// * `mem` - Direct access to TCM and CSRs.
    ///
    /// # Returns
    ///
    /// The signal the core reports for this cycle.
    fn tick(&mut self, mem: &mut dyn MemoryPort) -> HartSignal;

    /// Asserts the interrupt line.
    fn raise_interrupt(&mut self);

    /// Reads a register by name (`"pc"`, `"x1"`, ...); `None` if the name is unknown.
    fn register(&self, name: &str) -> Option<u64>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    Signal(HartSignal),
    Store { addr: BusAddr, data: Vec<u8> },
}

/// A core that plays back a fixed script.
///
/// Offsets count executed cycles since release (the first executed cycle is 1). The PC
/// advances by 4 every executed cycle. A scripted store that the bus refuses makes the
/// core report [`HartSignal::Fault`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptedHart {
    script: Vec<(u64, Action)>,
    next: usize,
    executed: u64,
    pc: u64,
    interrupts: u64,
}

impl ScriptedHart {
    /// Creates a core that runs forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a core that halts on its `cycles`-th executed cycle.
    pub fn halting_after(cycles: u64) -> Self {
        Self::new().with_signal_at(cycles, HartSignal::Halted)
    }

    fn push(mut self, at: u64, action: Action) -> Self {
        let idx = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(idx, (at, action));
        self
    }

    /// Reports `signal` on executed cycle `at`.
    pub fn with_signal_at(self, at: u64, signal: HartSignal) -> Self {
        self.push(at, Action::Signal(signal))
    }

    /// Executes WFI on executed cycle `at`.
    pub fn with_wfi_at(self, at: u64) -> Self {
        self.with_signal_at(at, HartSignal::WaitForInterrupt)
    }

    /// Stores `data` at `addr` on executed cycle `at`.
    pub fn with_store_at(self, at: u64, addr: BusAddr, data: Vec<u8>) -> Self {
        self.push(at, Action::Store { addr, data })
    }

    /// Cycles executed since release.
    pub const fn executed(&self) -> u64 {
        self.executed
    }

    /// Interrupts raised since reset.
    pub const fn interrupts(&self) -> u64 {
        self.interrupts
    }
}

impl Hart for ScriptedHart {
    fn reset(&mut self) {
        self.next = 0;
        self.executed = 0;
        self.pc = 0;
        self.interrupts = 0;
    }

    fn release(&mut self, pc: u64) {
        self.pc = pc;
    }

    fn tick(&mut self, mem: &mut dyn MemoryPort) -> HartSignal {
        self.executed += 1;
        self.pc = self.pc.wrapping_add(4);
        while let Some((at, action)) = self.script.get(self.next) {
            if *at > self.executed {
                break;
            }
            self.next += 1;
            match action {
                Action::Signal(signal) => return *signal,
                Action::Store { addr, data } => {
                    if mem.write_bytes(*addr, data).is_err() {
                        return HartSignal::Fault;
                    }
                }
            }
        }
        HartSignal::Running
    }

    fn raise_interrupt(&mut self) {
        self.interrupts += 1;
    }

    fn register(&self, name: &str) -> Option<u64> {
        match name {
            "pc" => Some(self.pc),
            "mcycle" | "minstret" => Some(self.executed),
            "x0" | "zero" => Some(0),
            _ => None,
        }
    }
}
