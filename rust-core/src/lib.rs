//! RHEED Analysis Core
//!
//! Real-time region aggregation, line scans and spectral analysis of RHEED
//! camera frames, with optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![allow(non_local_definitions)]

pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod regions;
pub mod series;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use camera::{open_camera, CameraConfig, FrameSource};
pub use config::AnalysisConfig;
pub use error::{Result, RheedError};
pub use frame::Frame;
pub use pipeline::{AnalysisEvent, CsvFrameSink, RheedProcessor};
pub use regions::{BoundingBox, ChannelSelection, LineSegment, RegionId, Shape};
pub use series::{apply_cutoffs, snip};
pub use spectrum::{calc_fft, detect_peaks, SpectrumAnalyzer};
