//! Python bindings for the series and spectrum helpers

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::series;
use crate::spectrum;

/// Truncate two sequences to their common trailing length
///
/// Returns:
///     Tuple of (a, b) with equal lengths
#[pyfunction]
pub fn snip(a: Vec<f64>, b: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    series::snip_vecs(a, b)
}

/// Keep points whose x lies in [minval, maxval]
///
/// Args:
///     x: X values as numpy array
///     y: Y values as numpy array
///     minval: Lower bound, or None for min(x)
///     maxval: Upper bound, or None for max(x)
#[pyfunction]
#[pyo3(signature = (x, y, minval=None, maxval=None))]
pub fn apply_cutoffs<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
    y: PyReadonlyArray1<f64>,
    minval: Option<f64>,
    maxval: Option<f64>,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let (x, y) = series::apply_cutoffs(x.as_slice()?, y.as_slice()?, minval, maxval);
    Ok((PyArray1::from_vec(py, x), PyArray1::from_vec(py, y)))
}

/// Power spectral density of a time series
///
/// Args:
///     x: Timestamps in seconds
///     y: Values
///
/// Returns:
///     Tuple of (frequency, psd) arrays, or None if the series cannot be
///     analyzed
#[pyfunction]
pub fn calc_fft<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
    y: PyReadonlyArray1<f64>,
) -> PyResult<Option<(&'py PyArray1<f64>, &'py PyArray1<f64>)>> {
    let spectrum = spectrum::calc_fft(x.as_slice()?, y.as_slice()?);
    Ok(spectrum.map(|s| {
        (
            PyArray1::from_vec(py, s.frequency),
            PyArray1::from_vec(py, s.power),
        )
    }))
}

/// Frequencies of spectral peaks
///
/// Returns:
///     Array of peak frequencies (possibly empty), or None if detection
///     could not run
#[pyfunction]
#[pyo3(signature = (x, y, min_freq=0.0))]
pub fn detect_peaks<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
    y: PyReadonlyArray1<f64>,
    min_freq: f64,
) -> PyResult<Option<&'py PyArray1<f64>>> {
    let peaks = spectrum::detect_peaks(x.as_slice()?, y.as_slice()?, min_freq);
    Ok(peaks.map(|p| PyArray1::from_vec(py, p.frequencies)))
}
