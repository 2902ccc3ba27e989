//! Common types shared by every layer of the driver.
//!
//! 1. **Address Types:** A strong type for bus addresses.
//! 2. **Error Handling:** The `DriverError` taxonomy and the crate-wide `Result` alias.

/// Bus address type.
pub mod addr;

/// Error types.
pub mod error;

pub use addr::BusAddr;
pub use error::{DriverError, Precondition, Result};
