//! Simulator Python binding.
//!
//! Exposes `Driver` to Python as `Simulator(hart, config=None)`: load programs, run, step
//! and wait, read and write memory, raise interrupts and reset. Python calls block while
//! the driver advances its clock; the hart's `tick()` is called back on every running cycle.

use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::PyBytes;
use tcmbus_core::sim::payload::HostBuffer;
use tcmbus_core::{Config, Driver};

use crate::conversion::{Probe, driver_err, probe_buffer, py_dict_to_config};
use crate::hart::PyHart;

/// Python-exposed simulator: one device driven through its TCM bus interface.
#[pyclass(name = "Simulator")]
#[derive(Debug)]
pub struct PySimulator {
    inner: Driver<PyHart>,
}

#[pymethods]
impl PySimulator {
    /// Creates a simulator around a Python core model.
    ///
    /// # Arguments
    ///
    /// * `hart` - Object implementing `tick()` (and optionally `reset`, `release`,
    ///   `raise_interrupt`, `register`).
    /// * `config` - Optional config dict; defaults are used when omitted.
    #[new]
    #[pyo3(signature = (hart, config=None))]
    fn new(py: Python<'_>, hart: &Bound<'_, PyAny>, config: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => py_dict_to_config(py, dict)?,
            None => Config::default(),
        };
        let hart = PyHart::new(hart)?;
        let inner = Driver::new(config, hart).map_err(driver_err)?;
        Ok(Self { inner })
    }

    /// Loads an ELF file; returns the recorded entry point.
    #[pyo3(signature = (path, entry_point=None))]
    fn load_program(&mut self, path: PathBuf, entry_point: Option<u64>) -> PyResult<u64> {
        self.inner.load_program(path, entry_point).map_err(driver_err)
    }

    /// Loads an ELF file and returns the addresses of `names`.
    fn load_elf_and_lookup_symbols(
        &mut self,
        path: PathBuf,
        names: Vec<String>,
    ) -> PyResult<BTreeMap<String, u64>> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.inner
            .load_elf_and_lookup_symbols(path, &names)
            .map_err(driver_err)
    }

    /// Releases the core.
    fn run(&mut self) -> PyResult<()> {
        self.inner.run().map_err(driver_err)
    }

    /// Sets the start PC and releases the core.
    fn execute_from(&mut self, entry_point: u64) -> PyResult<()> {
        self.inner.execute_from(entry_point).map_err(driver_err)
    }

    /// Waits for halt within the configured budget; returns cycles waited.
    fn wait(&mut self) -> PyResult<u64> {
        self.inner.wait().map_err(driver_err)
    }

    /// Waits for WFI; returns cycles waited.
    #[pyo3(signature = (timeout_cycles=None))]
    fn wait_for_wfi(&mut self, timeout_cycles: Option<u64>) -> PyResult<u64> {
        let budget = timeout_cycles.unwrap_or(self.inner.config().general.wait_timeout_cycles);
        self.inner.wait_for_wfi(budget).map_err(driver_err)
    }

    /// Waits for halt; returns cycles waited.
    #[pyo3(signature = (timeout_cycles=None))]
    fn wait_for_halted(&mut self, timeout_cycles: Option<u64>) -> PyResult<u64> {
        let budget = timeout_cycles.unwrap_or(self.inner.config().general.wait_timeout_cycles);
        self.inner.wait_for_halted(budget).map_err(driver_err)
    }

    /// Releases the core and waits for it to halt.
    #[pyo3(signature = (timeout_cycles=1_000_000))]
    fn run_to_halt(&mut self, timeout_cycles: u64) -> PyResult<u64> {
        self.inner.run_to_halt(timeout_cycles).map_err(driver_err)
    }

    /// Advances up to `n` cycles; returns cycles advanced.
    fn step(&mut self, n: u64) -> u64 {
        self.inner.step(n)
    }

    /// Cycles since the last reset.
    fn get_cycle_count(&self) -> u64 {
        self.inner.cycle_count()
    }

    /// Reads `length` bytes at `address`.
    fn read_memory<'py>(
        &mut self,
        py: Python<'py>,
        address: u64,
        length: u64,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.inner.read(address, length).map_err(driver_err)?;
        Ok(PyBytes::new(py, &data))
    }

    /// Writes a buffer (bytes, bytearray, numpy array, ...) at `address`.
    ///
    /// Raises `TypeError` for objects without a contiguous buffer, such as lists or `str`.
    fn write_memory(&mut self, address: u64, data: &Bound<'_, PyAny>) -> PyResult<()> {
        let probe = probe_buffer(data)?;
        let payload = match &probe {
            Probe::Contiguous(bytes, item_size) => HostBuffer::Contiguous {
                bytes: bytes.as_bytes(),
                item_size: *item_size,
            },
            Probe::Strided(type_name) => HostBuffer::Strided { type_name },
            Probe::Opaque(type_name) => HostBuffer::Opaque { type_name },
        };
        self.inner.write_host(address, payload).map_err(driver_err)
    }

    /// Writes one little-endian 32-bit word.
    fn write_word(&mut self, address: u64, value: u32) -> PyResult<()> {
        self.inner.write_word(address, value).map_err(driver_err)
    }

    /// Reads one little-endian 32-bit word.
    fn read_word(&mut self, address: u64) -> PyResult<u32> {
        self.inner.read_word(address).map_err(driver_err)
    }

    /// Reads a core register as a `0x`-prefixed hex string.
    fn read_register(&self, name: &str) -> PyResult<String> {
        self.inner.read_register(name).map_err(driver_err)
    }

    /// Raises the core's interrupt line.
    fn raise_interrupt(&mut self) -> PyResult<()> {
        self.inner.raise_interrupt().map_err(driver_err)
    }

    /// Returns the device to reset.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Current device state (`"reset"`, `"loaded"`, `"running"`, ...).
    fn state(&self) -> String {
        serde_json::to_value(self.inner.state())
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Whether the core stopped on a fault.
    fn fault(&self) -> bool {
        self.inner.fault()
    }

    /// State, cycles and bus counters as a dict.
    fn report<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let json = self
            .inner
            .report()
            .to_json()
            .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
        py.import("json")?.call_method1("loads", (json,))
    }

    /// Human-readable report.
    fn summary(&self) -> String {
        self.inner.report().summary()
    }
}
