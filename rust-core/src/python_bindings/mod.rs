//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::RheedError;

mod calcs_bindings;
mod processor_bindings;

impl From<RheedError> for PyErr {
    fn from(err: RheedError) -> Self {
        match err {
            RheedError::UnknownRegion(_) | RheedError::UnknownProperty(_) => {
                PyKeyError::new_err(err.to_string())
            }
            RheedError::EmptyRegion(_)
            | RheedError::InvalidGeometry { .. }
            | RheedError::DuplicateRegion(_)
            | RheedError::InvalidFrame(_)
            | RheedError::Config(_)
            | RheedError::ConfigParse(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn rheed_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calcs_bindings::snip, m)?)?;
    m.add_function(wrap_pyfunction!(calcs_bindings::apply_cutoffs, m)?)?;
    m.add_function(wrap_pyfunction!(calcs_bindings::calc_fft, m)?)?;
    m.add_function(wrap_pyfunction!(calcs_bindings::detect_peaks, m)?)?;

    m.add_class::<processor_bindings::PyRheedProcessor>()?;

    Ok(())
}
