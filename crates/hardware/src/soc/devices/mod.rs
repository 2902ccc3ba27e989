//! Memory-mapped devices other than TCM.

/// Control/status register block.
pub mod csr;

pub use self::csr::CsrBlock;
