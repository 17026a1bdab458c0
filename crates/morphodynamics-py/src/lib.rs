use morphodynamics_core::{GridField, SimParams, Simulation};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

/// PyO3 module handing field arrays to a Python renderer.
#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

fn field_from_rows(rows: Vec<Vec<f32>>) -> PyResult<GridField> {
    let n = rows.len();
    if rows.iter().any(|row| row.len() != n) {
        return Err(PyValueError::new_err("field must be a square list of rows"));
    }
    Ok(GridField::from_vec(n, rows.into_iter().flatten().collect()))
}

/// Log-magnitude, center-shifted spectrum of an arbitrary square field.
#[pyfunction]
fn spectrum(field: Vec<Vec<f32>>) -> PyResult<Vec<Vec<f32>>> {
    let field = field_from_rows(field)?;
    Ok(morphodynamics_core::spectrum(&field).to_rows())
}

#[pyclass(name = "Simulation")]
struct PySimulation {
    inner: Simulation,
}

#[pymethods]
impl PySimulation {
    /// `params_json` overrides any subset of the default parameters.
    #[new]
    #[pyo3(signature = (params_json=None))]
    fn new(params_json: Option<&str>) -> PyResult<Self> {
        let params = match params_json {
            Some(json) => {
                SimParams::from_json(json).map_err(|e| PyValueError::new_err(e.to_string()))?
            }
            None => SimParams::default(),
        };
        let inner = Simulation::try_new(params).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Advance one tick and return `(gas, radiation)` as nested lists.
    fn tick(&mut self) -> PyResult<(Vec<Vec<f32>>, Vec<Vec<f32>>)> {
        let (gas, radiation) = self
            .inner
            .try_tick()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok((gas.to_rows(), radiation.to_rows()))
    }

    fn spectrum(&self) -> Vec<Vec<f32>> {
        self.inner.spectrum().to_rows()
    }

    #[getter]
    fn ticks_done(&self) -> usize {
        self.inner.ticks_done()
    }

    fn is_done(&self) -> bool {
        self.inner.phase() == morphodynamics_core::RunPhase::Done
    }

    /// Run `ticks` ticks and return the metrics summary as JSON.
    #[pyo3(signature = (ticks, sample_every=1))]
    fn run_experiment_json(&mut self, ticks: usize, sample_every: usize) -> PyResult<String> {
        let summary = self
            .inner
            .try_run_experiment(ticks, sample_every)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        serde_json::to_string(&summary).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum, m)?)?;
    m.add_class::<PySimulation>()?;
    Ok(())
}
