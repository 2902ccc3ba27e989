//! Python-implemented core model.
//!
//! Wraps any Python object as a `Hart`. The object must provide `tick()` returning one of
//! `"running"`, `"wfi"`, `"halted"` or `"fault"`. `reset()`, `release(pc)`,
//! `raise_interrupt()` and `register(name)` are optional.
//!
//! Python cores do not see TCM during `tick`; a test reads and writes memory through the
//! `Simulator` between steps instead.

use pyo3::prelude::*;
use tcmbus_core::core::{Hart, HartSignal};
use tcmbus_core::soc::traits::MemoryPort;
use tracing::error;

/// A core model implemented in Python.
#[derive(Debug)]
pub struct PyHart {
    obj: Py<PyAny>,
}

impl PyHart {
    /// Wraps `obj`, checking that it has a `tick` method.
    ///
    /// # Errors
    ///
    /// `TypeError` if `obj` has no `tick` attribute.
    pub fn new(obj: &Bound<'_, PyAny>) -> PyResult<Self> {
        if !obj.hasattr("tick")? {
            return Err(pyo3::exceptions::PyTypeError::new_err(
                "hart must implement tick()",
            ));
        }
        Ok(Self {
            obj: obj.clone().unbind(),
        })
    }

    fn has_method(obj: &Bound<'_, PyAny>, method: &str) -> bool {
        obj.hasattr(method).unwrap_or_else(|e| {
            error!(method, "python hart lookup failed: {e}");
            false
        })
    }

    fn report(method: &str, result: PyResult<Bound<'_, PyAny>>) {
        if let Err(e) = result {
            error!(method, "python hart raised: {e}");
        }
    }
}

impl Hart for PyHart {
    fn reset(&mut self) {
        Python::with_gil(|py| {
            let obj = self.obj.bind(py);
            if Self::has_method(obj, "reset") {
                Self::report("reset", obj.call_method0("reset"));
            }
        });
    }

    fn release(&mut self, pc: u64) {
        Python::with_gil(|py| {
            let obj = self.obj.bind(py);
            if Self::has_method(obj, "release") {
                Self::report("release", obj.call_method1("release", (pc,)));
            }
        });
    }

    fn tick(&mut self, _mem: &mut dyn MemoryPort) -> HartSignal {
        Python::with_gil(|py| {
            let signal = self
                .obj
                .bind(py)
                .call_method0("tick")
                .and_then(|v| v.extract::<String>());
            match signal.as_deref() {
                Ok("running") => HartSignal::Running,
                Ok("wfi") => HartSignal::WaitForInterrupt,
                Ok("halted") => HartSignal::Halted,
                Ok("fault") => HartSignal::Fault,
                Ok(other) => {
                    error!(signal = other, "python hart returned an unknown signal");
                    HartSignal::Fault
                }
                Err(e) => {
                    error!("python hart tick() raised: {e}");
                    HartSignal::Fault
                }
            }
        })
    }

    fn raise_interrupt(&mut self) {
        Python::with_gil(|py| {
            let obj = self.obj.bind(py);
            if Self::has_method(obj, "raise_interrupt") {
                Self::report("raise_interrupt", obj.call_method0("raise_interrupt"));
            }
        });
    }

    fn register(&self, name: &str) -> Option<u64> {
        Python::with_gil(|py| {
            let obj = self.obj.bind(py);
            if !Self::has_method(obj, "register") {
                return None;
            }
            obj.call_method1("register", (name,))
                .and_then(|v| v.extract::<Option<u64>>())
                .unwrap_or_else(|e| {
                    error!(register = name, "python hart register() raised: {e}");
                    None
                })
        })
    }
}
