//! Python↔Rust conversions.
//!
//! Converts Python config dicts into the core `Config` via JSON, classifies host objects
//! offered as write payloads, and maps driver errors onto Python exception types.

use pyo3::exceptions::{PyOSError, PyRuntimeError, PyTimeoutError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use tcmbus_core::common::Precondition;
use tcmbus_core::{Config, DriverError};

/// Converts a Python dict to a validated driver `Config`.
///
/// The dict is serialized to JSON and then deserialized into `Config`. Keys must match
/// the Rust config structure (`general`, `system`, `memory`).
///
/// # Arguments
///
/// * `py` - Python interpreter handle.
/// * `dict` - A Python dict.
///
/// # Returns
///
/// The validated `Config`, or a `ValueError` if the dict is invalid.
pub fn py_dict_to_config(py: Python<'_>, dict: &Bound<'_, PyAny>) -> PyResult<Config> {
    let json = py.import("json")?;
    let dumps = json.getattr("dumps")?;
    let json_str: String = dumps.call1((dict,))?.extract()?;
    Config::from_json(&json_str).map_err(driver_err)
}

/// Maps a driver error onto the matching Python exception.
///
/// * non-buffer payloads → `TypeError`
/// * other preconditions and bad configuration → `ValueError`
/// * wait and response timeouts → `TimeoutError`
/// * unreadable image files → `OSError`
/// * bus errors and malformed images → `RuntimeError`
pub fn driver_err(err: DriverError) -> PyErr {
    let msg = err.to_string();
    match err {
        DriverError::Precondition(Precondition::NotAByteBuffer { .. }) => PyTypeError::new_err(msg),
        DriverError::Precondition(_) | DriverError::Config(_) => PyValueError::new_err(msg),
        ref e if e.is_timeout() => PyTimeoutError::new_err(msg),
        DriverError::ImageIo { .. } => PyOSError::new_err(msg),
        _ => PyRuntimeError::new_err(msg),
    }
}

/// What a host object turned out to be when probed for the buffer protocol.
#[derive(Debug)]
pub enum Probe<'py> {
    /// A C-contiguous buffer, copied out as `bytes`, with its element size.
    Contiguous(Bound<'py, PyBytes>, usize),
    /// A buffer that is not C-contiguous.
    Strided(String),
    /// No buffer protocol at all.
    Opaque(String),
}

/// Probes `obj` through `memoryview`.
///
/// Lists, strings and numbers do not expose the buffer protocol and come back `Opaque`.
///
/// # Errors
///
/// Python errors raised while inspecting a valid `memoryview`.
pub fn probe_buffer<'py>(obj: &Bound<'py, PyAny>) -> PyResult<Probe<'py>> {
    let py = obj.py();
    let type_name = obj
        .get_type()
        .name()
        .map_or_else(|_| "object".to_owned(), |n| n.to_string());

    let memoryview = py.import("builtins")?.getattr("memoryview")?;
    let Ok(view) = memoryview.call1((obj,)) else {
        return Ok(Probe::Opaque(type_name));
    };
    let contiguous: bool = view.getattr("c_contiguous")?.extract()?;
    if !contiguous {
        return Ok(Probe::Strided(type_name));
    }
    let item_size: usize = view.getattr("itemsize")?.extract()?;
    let bytes = view.call_method0("tobytes")?.downcast_into::<PyBytes>()?;
    Ok(Probe::Contiguous(bytes, item_size))
}
