//! Periodic satellite-simulator diagnostics driver.
//!
//! On a configurable cadence the driver reconstructs geometric height from
//! column state, calls an external diagnostic engine, and zeroes statistics
//! for unlit columns (or for every column on skipped steps) so that
//! time-averaged outputs divided by the averaged `cosp_sunlit` echo give
//! daytime means.

pub mod config;
pub mod daytime;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fields;
pub mod height;
pub mod masking;
pub mod outputs;
pub mod schedule;
pub mod state;

#[cfg(feature = "python")]
mod python;

pub use config::{DiagnosticsConfig, EngineConstants, FrequencyUnits};
pub use daytime::DaytimeMean;
pub use driver::{CospDriver, StepOutcome};
pub use engine::{DiagnosticEngine, EngineInput};
pub use error::{DiagError, DiagResult};
pub use height::{reconstruct, reconstruct_from_state, ColumnHeights};
pub use masking::apply_mask;
pub use outputs::{DiagnosticOutputs, HistogramOutput, ScalarOutput};
pub use schedule::{cosp_do, normalize_frequency, StepInterval};
pub use state::ColumnState;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn cosp_driver(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    register_schedule_module(py_module)?;
    register_height_module(py_module)?;
    register_driver_module(py_module)?;

    py_module.add("__doc__", "Periodic satellite-simulator diagnostics driver.")?;

    Ok(())
}

#[cfg(feature = "python")]
fn register_schedule_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "schedule")?;
    submodule.add("__doc__", "Diagnostics cadence.")?;
    submodule.add_function(wrap_pyfunction!(python::normalize_frequency, &submodule)?)?;
    submodule.add_function(wrap_pyfunction!(python::cosp_do, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_height_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "height")?;
    submodule.add("__doc__", "Geometric height reconstruction.")?;
    submodule.add_function(wrap_pyfunction!(python::reconstruct_heights, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
fn register_driver_module(py_module: &Bound<'_, PyModule>) -> PyResult<()> {
    let submodule = PyModule::new(py_module.py(), "driver")?;
    submodule.add("__doc__", "Step driver with a Python diagnostic engine.")?;
    submodule.add_class::<python::PyCospDriver>()?;
    submodule.add_function(wrap_pyfunction!(python::output_fields, &submodule)?)?;
    py_module.add_submodule(&submodule)?;
    Ok(())
}
