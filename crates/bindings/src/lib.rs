//! Python bindings for the tcmbus bus-transaction driver.
//!
//! This crate exposes the driver to Python via PyO3. It provides:
//! 1. **Simulator:** `Simulator(hart, config=None)` wrapping one driver and device.
//! 2. **Python cores:** Any object with a `tick()` method can act as the core-under-test.
//! 3. **Conversions:** Config dicts, buffer probing and exception mapping.
//! 4. **Utilities:** Version string.
//!
//! Importing the module installs a `tracing` subscriber filtered by `RUST_LOG`.

use pyo3::prelude::*;
use tracing_subscriber::EnvFilter;

/// Python dict, buffer and error conversions.
pub mod conversion;
/// Python-implemented core model (`PyHart`).
pub mod hart;
/// Simulator binding (`PySimulator`).
pub mod simulator;
/// Utility functions (e.g., version).
pub mod utils;

/// Registers all classes and functions onto the given Python module.
///
/// # Arguments
///
/// * `m` - The Python module to register types and functions on.
///
/// # Returns
///
/// `Ok(())` on success, or a `PyErr` if registration fails.
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<simulator::PySimulator>()?;
    m.add_function(wrap_pyfunction!(utils::version, m)?)?;
    Ok(())
}

#[pymodule]
fn tcmbus(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    register_module(m)?;
    Ok(())
}
