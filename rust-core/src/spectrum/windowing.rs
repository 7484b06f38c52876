//! Window functions applied before the FFT to reduce spectral leakage

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Periodic Hann window: w[n] = 0.5 - 0.5*cos(2πn/N)
    ///
    /// Equal to a symmetric Hann window of length N+1 with its last sample
    /// dropped, matching spectra computed by earlier analysis tools.
    #[default]
    Hann,

    /// Symmetric Hann window: w[n] = 0.5 - 0.5*cos(2πn/(N-1))
    HannSymmetric,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (N)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..N-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    match window_type {
        WindowType::Hann => {
            let n_total = length as f64;
            (0..length)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / n_total).cos())
                .collect()
        }

        WindowType::HannSymmetric => {
            if length == 1 {
                return vec![1.0];
            }
            let m = length as f64;
            (0..length)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (m - 1.0)).cos())
                .collect()
        }

        WindowType::Rectangular => vec![1.0; length],
    }
}

/// Apply window in-place
pub fn apply_window_inplace(signal: &mut [f64], window_type: WindowType) {
    let window = generate_window(window_type, signal.len());

    for (s, w) in signal.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}
