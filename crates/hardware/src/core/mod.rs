//! Execution control.
//!
//! This module contains everything that decides when the device runs: the cycle clock,
//! the run-state machine, the core-under-test model trait, and the controller that ties
//! them to the device-side bus.

/// Cycle clock.
pub mod clock;

/// Run-state machine and blocking waits.
pub mod controller;

/// Core-under-test model trait and the scripted implementation.
pub mod hart;

/// Device states and wait conditions.
pub mod state;

pub use self::clock::Clock;
pub use self::controller::ExecutionController;
pub use self::hart::{Hart, HartSignal, ScriptedHart};
pub use self::state::{DeviceState, WaitCondition};
