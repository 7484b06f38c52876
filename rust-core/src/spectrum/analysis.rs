//! High-level spectrum analyzer
//!
//! Combines the time-window cutoff, FFT engine and peak detector for a
//! region's series snapshot.

use serde::{Deserialize, Serialize};

use super::fft::{FftEngine, Spectrum};
use super::peaks::{find_peaks, PeakConfig, PeakSet};
use super::windowing::WindowType;
use crate::series::{apply_cutoffs, SeriesSnapshot};

/// Spectrum analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Window applied before the FFT
    pub window_type: WindowType,

    /// Only analyze samples at or after this time (seconds)
    pub time_min: Option<f64>,

    /// Only analyze samples at or before this time (seconds)
    pub time_max: Option<f64>,

    /// Peak detection parameters
    pub peaks: PeakConfig,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            window_type: WindowType::Hann,
            time_min: None,
            time_max: None,
            peaks: PeakConfig::default(),
        }
    }
}

/// Spectrum of one series and the peaks found in it
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralAnalysis {
    pub spectrum: Spectrum,

    /// `None` if peak detection could not run on this spectrum
    pub peaks: Option<PeakSet>,
}

/// Spectrum analyzer for region time series
pub struct SpectrumAnalyzer {
    config: SpectrumConfig,
    fft_engine: FftEngine,
}

impl SpectrumAnalyzer {
    pub fn new(config: SpectrumConfig) -> Self {
        let fft_engine = FftEngine::new(config.window_type);
        Self { config, fft_engine }
    }

    /// Analyze a series snapshot
    ///
    /// # Returns
    /// `None` if the windowed series yields no spectrum
    pub fn analyze(&mut self, snapshot: &SeriesSnapshot) -> Option<SpectralAnalysis> {
        let (times, values) = apply_cutoffs(
            &snapshot.times,
            &snapshot.values,
            self.config.time_min,
            self.config.time_max,
        );

        let spectrum = self.fft_engine.compute_psd(&times, &values)?;
        let peaks = find_peaks(&spectrum.frequency, &spectrum.power, &self.config.peaks);

        Some(SpectralAnalysis { spectrum, peaks })
    }

    /// Update configuration
    pub fn update_config(&mut self, config: SpectrumConfig) {
        self.fft_engine.set_window_type(config.window_type);
        self.config = config;
    }

    /// Get current configuration
    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(SpectrumConfig::default())
    }
}
