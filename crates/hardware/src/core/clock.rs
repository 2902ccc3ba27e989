//! Cycle clock.
//!
//! The clock is the only source of time in the driver. Every wait, timeout and
//! pipeline stall is expressed as a number of ticks of this counter.

/// Monotonic cycle counter; cleared only by device reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    cycles: u64,
}

impl Clock {
    /// Creates a clock at cycle 0.
    pub const fn new() -> Self {
        Self { cycles: 0 }
    }

    /// Advances one cycle and returns the new count.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.cycles += 1;
        self.cycles
    }

    /// Cycles elapsed since the last reset.
    #[inline]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Clears the counter.
    pub fn reset(&mut self) {
        self.cycles = 0;
    }
}
