//! Device run states.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of the device under test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Held in reset. Only the image loader may touch the bus.
    #[default]
    Reset,
    /// An image is loaded and the entry point recorded.
    Loaded,
    /// The core is executing.
    Running,
    /// The core executed WFI and is waiting for an interrupt.
    WaitingForInterrupt,
    /// The core halted (normally or on a fault).
    Halted,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reset => "in reset",
            Self::Loaded => "loaded",
            Self::Running => "running",
            Self::WaitingForInterrupt => "waiting for interrupt",
            Self::Halted => "halted",
        };
        f.write_str(name)
    }
}

/// A hardware condition a caller can block on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// The core asserted WFI.
    WaitForInterrupt,
    /// The core asserted halt.
    Halted,
}

impl WaitCondition {
    /// Returns `true` if the condition holds in `state`.
    pub const fn holds(self, state: DeviceState) -> bool {
        matches!(
            (self, state),
            (Self::WaitForInterrupt, DeviceState::WaitingForInterrupt)
                | (Self::Halted, DeviceState::Halted)
        )
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitForInterrupt => f.write_str("wait-for-interrupt"),
            Self::Halted => f.write_str("halt"),
        }
    }
}
