//! Python bindings: numpy arrays in, numpy arrays out.
//!
//! Inputs and outputs are exchanged as dicts keyed by the stable field names
//! of [`crate::fields`] and [`crate::outputs`]. The diagnostic engine is a
//! Python callable taking a dict of input arrays and returning a dict with
//! every output array.

use numpy::{IntoPyArray, PyArray2, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::DiagnosticsConfig;
use crate::driver::{CospDriver, StepOutcome};
use crate::engine::{DiagnosticEngine, EngineInput};
use crate::error::{DiagError, DiagResult};
use crate::fields::{self, FieldSpec};
use crate::height;
use crate::outputs::{self, DiagnosticOutputs, HistogramOutput, ScalarOutput};
use crate::schedule::{self, StepInterval};
use crate::state::ColumnState;

impl From<DiagError> for PyErr {
    fn from(err: DiagError) -> PyErr {
        match err {
            DiagError::Engine(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

// ── Stateless helpers ─────────────────────────────────────────────────────

/// Convert a cadence (`"steps"` or `"hours"`) into a step interval.
#[pyfunction]
pub fn normalize_frequency(frequency: i64, units: &str, dt: f64) -> PyResult<u64> {
    let units = units.parse()?;
    Ok(schedule::normalize_frequency(frequency, units, dt)?.get())
}

/// True when `step` is an active step for the given interval.
#[pyfunction]
pub fn cosp_do(interval: u64, step: u64) -> PyResult<bool> {
    Ok(schedule::cosp_do(StepInterval::new(interval)?, step))
}

/// Interface and mid-level heights from thickness `[C, L]` and surface
/// height `[C]`. Returns `(z_int, z_mid)`.
#[pyfunction]
pub fn reconstruct_heights<'py>(
    py: Python<'py>,
    thickness: PyReadonlyArray2<'py, f64>,
    z_surf: PyReadonlyArray1<'py, f64>,
) -> PyResult<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
    let heights = height::reconstruct(thickness.as_array(), z_surf.as_array())?;
    Ok((heights.z_int.into_pyarray(py), heights.z_mid.into_pyarray(py)))
}

/// Output catalog: name -> (unit, dimension names, note or None).
#[pyfunction]
pub fn output_fields(py: Python<'_>) -> PyResult<Bound<'_, PyDict>> {
    let dict = PyDict::new(py);
    for spec in outputs::output_specs() {
        dict.set_item(
            spec.name,
            (spec.unit, spec.layout.dims(), outputs::output_note(spec.name)),
        )?;
    }
    Ok(dict)
}

// ── Engine backed by a Python callable ────────────────────────────────────

pub struct PyCallableEngine {
    callback: Py<PyAny>,
}

impl PyCallableEngine {
    fn call(&self, py: Python<'_>, input: &EngineInput<'_>, out: &mut DiagnosticOutputs) -> PyResult<()> {
        let args = PyDict::new(py);
        args.set_item("sunlit", input.sunlit.to_owned().into_pyarray(py))?;
        args.set_item("surf_radiative_T", input.skt.to_owned().into_pyarray(py))?;
        for (name, view) in [
            ("T_mid", input.t_mid),
            ("p_mid", input.p_mid),
            ("p_int", input.p_int),
            ("z_mid", input.z_mid),
            ("qv", input.qv),
            ("qc", input.qc),
            ("qi", input.qi),
            ("cldfrac_rad", input.cldfrac),
            ("eff_radius_qc", input.reff_qc),
            ("eff_radius_qi", input.reff_qi),
            ("dtau067", input.dtau067),
            ("dtau105", input.dtau105),
        ] {
            args.set_item(name, view.to_owned().into_pyarray(py))?;
        }
        let c = input.constants;
        args.set_item("ncol", input.ncol)?;
        args.set_item("nlev", input.nlev)?;
        args.set_item("subcolumns", c.subcolumns)?;
        args.set_item("emsfc_lw", c.emsfc_lw)?;
        args.set_item(
            "bins",
            (c.num_tau, c.num_ctp, c.num_cth, c.num_lwp, c.num_iwp, c.num_rel, c.num_rei),
        )?;

        let result = self.callback.call1(py, (args,))?;
        let result = result.bind(py).downcast::<PyDict>()?;

        for field in ScalarOutput::ALL {
            let arr: PyReadonlyArray1<f64> = required(result, field.name())?.extract()?;
            let arr = arr.as_array();
            let mut dst = out.scalar_mut(field);
            check_engine_shape(field.name(), arr.shape(), dst.shape())?;
            dst.assign(&arr);
        }
        for field in HistogramOutput::ALL {
            let arr: PyReadonlyArray3<f64> = required(result, field.name())?.extract()?;
            let arr = arr.as_array();
            let mut dst = out.histogram_mut(field);
            check_engine_shape(field.name(), arr.shape(), dst.shape())?;
            dst.assign(&arr);
        }
        Ok(())
    }
}

fn required<'py>(dict: &Bound<'py, PyDict>, name: &str) -> PyResult<Bound<'py, PyAny>> {
    dict.get_item(name)?
        .ok_or_else(|| PyValueError::new_err(format!("engine result is missing '{name}'")))
}

fn check_engine_shape(name: &str, actual: &[usize], expected: &[usize]) -> PyResult<()> {
    if actual != expected {
        return Err(PyValueError::new_err(format!(
            "engine result '{name}' has shape {actual:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

impl DiagnosticEngine for PyCallableEngine {
    fn compute(&mut self, input: &EngineInput<'_>, outputs: &mut DiagnosticOutputs) -> DiagResult<()> {
        Python::with_gil(|py| self.call(py, input, outputs)).map_err(|e| DiagError::Engine(e.to_string()))
    }
}

// ── Driver ────────────────────────────────────────────────────────────────

fn input_2d<'py>(inputs: &Bound<'py, PyDict>, spec: &FieldSpec) -> PyResult<PyReadonlyArray2<'py, f64>> {
    input_item(inputs, spec)?.extract()
}

fn input_1d<'py>(inputs: &Bound<'py, PyDict>, spec: &FieldSpec) -> PyResult<PyReadonlyArray1<'py, f64>> {
    input_item(inputs, spec)?.extract()
}

fn input_item<'py>(inputs: &Bound<'py, PyDict>, spec: &FieldSpec) -> PyResult<Bound<'py, PyAny>> {
    inputs.get_item(spec.name)?.ok_or_else(|| {
        PyValueError::new_err(format!("missing input '{}' [{}]", spec.name, spec.unit))
    })
}

/// Periodic diagnostics driver with a Python engine callable.
#[pyclass(name = "CospDriver")]
pub struct PyCospDriver {
    inner: CospDriver<PyCallableEngine>,
    outputs: DiagnosticOutputs,
}

impl PyCospDriver {
    fn outputs_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        for field in ScalarOutput::ALL {
            dict.set_item(field.name(), self.outputs.scalar(field).to_owned().into_pyarray(py))?;
        }
        for field in HistogramOutput::ALL {
            dict.set_item(field.name(), self.outputs.histogram(field).to_owned().into_pyarray(py))?;
        }
        dict.set_item(
            fields::COSP_SUNLIT.name,
            self.outputs.sunlit_echo().to_owned().into_pyarray(py),
        )?;
        Ok(dict)
    }
}

#[pymethods]
impl PyCospDriver {
    #[new]
    #[pyo3(signature = (ncol, nlev, dt, engine, frequency=1, frequency_units="steps", subcolumns=10))]
    fn new(
        ncol: usize,
        nlev: usize,
        dt: f64,
        engine: Py<PyAny>,
        frequency: i64,
        frequency_units: &str,
        subcolumns: usize,
    ) -> PyResult<Self> {
        let config = DiagnosticsConfig::from_parts(frequency, frequency_units, subcolumns)?;
        let engine = PyCallableEngine { callback: engine };
        Ok(Self {
            inner: CospDriver::new(config, ncol, nlev, dt, engine)?,
            outputs: DiagnosticOutputs::zeros(ncol),
        })
    }

    #[getter]
    fn interval(&self) -> u64 {
        self.inner.interval().get()
    }

    #[getter]
    fn engine_calls(&self) -> u64 {
        self.inner.engine_calls()
    }

    /// Run one step. Returns `(active, outputs)`.
    fn run<'py>(
        &mut self,
        py: Python<'py>,
        step: u64,
        inputs: &Bound<'py, PyDict>,
    ) -> PyResult<(bool, Bound<'py, PyDict>)> {
        let p_mid = input_2d(inputs, &fields::P_MID)?;
        let p_int = input_2d(inputs, &fields::P_INT)?;
        let t_mid = input_2d(inputs, &fields::T_MID)?;
        let qv = input_2d(inputs, &fields::QV)?;
        let qc = input_2d(inputs, &fields::QC)?;
        let qi = input_2d(inputs, &fields::QI)?;
        let cldfrac = input_2d(inputs, &fields::CLDFRAC)?;
        let reff_qc = input_2d(inputs, &fields::REFF_QC)?;
        let reff_qi = input_2d(inputs, &fields::REFF_QI)?;
        let dtau067 = input_2d(inputs, &fields::DTAU067)?;
        let dtau105 = input_2d(inputs, &fields::DTAU105)?;
        let pseudo_density = input_2d(inputs, &fields::PSEUDO_DENSITY)?;
        let phis = input_1d(inputs, &fields::PHIS)?;
        let skt = input_1d(inputs, &fields::SURF_RADIATIVE_T)?;
        let sunlit = input_1d(inputs, &fields::SUNLIT)?;

        let state = ColumnState {
            p_mid: p_mid.as_array(),
            p_int: p_int.as_array(),
            t_mid: t_mid.as_array(),
            qv: qv.as_array(),
            qc: qc.as_array(),
            qi: qi.as_array(),
            cldfrac: cldfrac.as_array(),
            reff_qc: reff_qc.as_array(),
            reff_qi: reff_qi.as_array(),
            dtau067: dtau067.as_array(),
            dtau105: dtau105.as_array(),
            pseudo_density: pseudo_density.as_array(),
            phis: phis.as_array(),
            skt: skt.as_array(),
            sunlit: sunlit.as_array(),
        };

        let outcome = self.inner.run(step, &state, &mut self.outputs)?;
        Ok((outcome == StepOutcome::Active, self.outputs_dict(py)?))
    }

    /// Current output buffers keyed by field name.
    fn outputs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        self.outputs_dict(py)
    }

    fn finalize(&mut self) {
        self.inner.finalize();
    }
}
