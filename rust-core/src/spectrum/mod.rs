//! Spectral analysis of region time series

pub mod windowing;
pub mod fft;
pub mod peaks;
pub mod analysis;

pub use windowing::{generate_window, WindowType};
pub use fft::{calc_fft, FftEngine, Spectrum};
pub use peaks::{detect_peaks, find_peaks, PeakConfig, PeakSet};
pub use analysis::{SpectralAnalysis, SpectrumAnalyzer, SpectrumConfig};
