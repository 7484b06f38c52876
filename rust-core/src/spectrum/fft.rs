//! Power spectral density of a region's time series using realfft
//!
//! Camera timestamps jitter, but the estimate treats the series as uniformly
//! sampled with spacing `(t_last - t_first) / N`. This is an approximation,
//! not a resampling step.

use std::sync::Arc;

use log::debug;
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use super::windowing::{apply_window_inplace, WindowType};
use crate::series::{snip, snip_vecs};

/// One-sided spectrum of a real series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// Frequency axis in Hz (k / (N·Δ))
    pub frequency: Vec<f64>,

    /// sqrt(2·|X[k]|² / Σ|windowed|²)
    pub power: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequency.len().min(self.power.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frequency resolution (spacing between bins)
    pub fn bin_width(&self) -> Option<f64> {
        match self.frequency.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }

    /// Frequency of the strongest bin above DC
    pub fn dominant_frequency(&self) -> Option<f64> {
        let (freq, power) = snip(&self.frequency, &self.power);
        freq.iter()
            .zip(power.iter())
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(&f, _)| f)
    }
}

/// FFT engine for irregularly terminated, near-uniform time series
pub struct FftEngine {
    window_type: WindowType,

    /// Cached forward plan, re-planned when the series length changes
    r2c: Option<Arc<dyn RealToComplex<f64>>>,
}

impl FftEngine {
    pub fn new(window_type: WindowType) -> Self {
        Self {
            window_type,
            r2c: None,
        }
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn set_window_type(&mut self, window_type: WindowType) {
        self.window_type = window_type;
    }

    /// Compute the PSD estimate of `y` sampled at times `x`
    ///
    /// # Returns
    /// `None` when the data is empty, contains NaN, has no time span, is
    /// constant, or produces a non-finite result
    pub fn compute_psd(&mut self, x: &[f64], y: &[f64]) -> Option<Spectrum> {
        let (x, y) = snip(x, y);
        if x.is_empty() || x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return None;
        }

        let n = x.len();
        let spacing = (x[n - 1] - x[0]) / n as f64;
        if !(spacing.is_finite() && spacing > 0.0) {
            debug!("Series of {} samples has no usable time span", n);
            return None;
        }
        let frequency = frequency_axis(n, spacing);

        // Mean removal of a constant series leaves only rounding noise
        if y.iter().all(|&v| v == y[0]) {
            return None;
        }
        let mean = y.iter().sum::<f64>() / n as f64;
        let mut windowed: Vec<f64> = y.iter().map(|&v| v - mean).collect();
        apply_window_inplace(&mut windowed, self.window_type);

        let energy: f64 = windowed.iter().map(|v| v * v).sum();
        if !(energy.is_finite() && energy > 0.0) {
            debug!("Windowed series has no energy");
            return None;
        }

        let r2c = self.plan(n);
        let mut output: Vec<Complex<f64>> = r2c.make_output_vec();
        if r2c.process(&mut windowed, &mut output).is_err() {
            debug!("FFT processing failed for {} samples", n);
            return None;
        }

        let power: Vec<f64> = output
            .iter()
            .map(|c| (2.0 * c.norm_sqr() / energy).sqrt())
            .collect();
        if power.iter().any(|p| !p.is_finite()) {
            return None;
        }

        let (frequency, power) = snip_vecs(frequency, power);
        Some(Spectrum { frequency, power })
    }

    fn plan(&mut self, n: usize) -> Arc<dyn RealToComplex<f64>> {
        if let Some(plan) = &self.r2c {
            if plan.len() == n {
                return Arc::clone(plan);
            }
        }
        let plan = RealFftPlanner::<f64>::new().plan_fft_forward(n);
        self.r2c = Some(Arc::clone(&plan));
        plan
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new(WindowType::default())
    }
}

/// One-sided frequency axis for `n` real samples at `spacing` seconds
///
/// # Returns
/// `n/2 + 1` frequencies `k / (n·spacing)`
pub fn frequency_axis(n: usize, spacing: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * spacing);
    (0..=n / 2).map(|k| k as f64 * scale).collect()
}

/// Compute the PSD with the default periodic Hann window
pub fn calc_fft(x: &[f64], y: &[f64]) -> Option<Spectrum> {
    FftEngine::default().compute_psd(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sampled(freq_hz: f64, sample_rate: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64 / sample_rate).collect();
        let y = t.iter().map(|&ti| (2.0 * PI * freq_hz * ti).sin()).collect();
        (t, y)
    }

    #[test]
    fn test_frequency_axis() {
        let freqs = frequency_axis(10, 0.1);
        assert_eq!(freqs.len(), 6);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[5] - 5.0).abs() < 1e-12);

        assert_eq!(frequency_axis(9, 0.1).len(), 5);
    }

    #[test]
    fn test_sine_peak_location() {
        let (t, y) = sampled(5.0, 100.0, 1000);
        let spectrum = calc_fft(&t, &y).unwrap();

        assert_eq!(spectrum.frequency.len(), 501);
        assert_eq!(spectrum.power.len(), 501);

        let dominant = spectrum.dominant_frequency().unwrap();
        let bin = spectrum.bin_width().unwrap();
        assert!((dominant - 5.0).abs() <= bin);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let (t, y) = sampled(3.0, 50.0, 257);
        let mut engine = FftEngine::default();

        let first = engine.compute_psd(&t, &y).unwrap();
        let second = engine.compute_psd(&t, &y).unwrap();
        let fresh = calc_fft(&t, &y).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }

    #[test]
    fn test_constant_input_has_no_result() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let y = vec![0.3; 100];
        assert!(calc_fft(&t, &y).is_none());
    }

    #[test]
    fn test_invalid_input_has_no_result() {
        assert!(calc_fft(&[], &[]).is_none());
        assert!(calc_fft(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0]).is_none());

        // Single sample has no time span
        assert!(calc_fft(&[1.0], &[2.0]).is_none());

        // All timestamps equal
        assert!(calc_fft(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_mismatched_lengths_use_recent_samples() {
        let (t, y) = sampled(2.0, 40.0, 200);
        let padded_t: Vec<f64> = std::iter::once(-1.0).chain(t.iter().copied()).collect();

        let aligned = calc_fft(&padded_t, &y).unwrap();
        let direct = calc_fft(&t, &y).unwrap();
        assert_eq!(aligned, direct);
    }

    #[test]
    fn test_power_is_non_negative() {
        let (t, y) = sampled(7.0, 64.0, 128);
        let spectrum = calc_fft(&t, &y).unwrap();
        assert!(spectrum.power.iter().all(|&p| p >= 0.0));
    }
}
