//! Analysis configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or `{}`)
//! is a valid configuration.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RheedError};
use crate::spectrum::SpectrumConfig;

/// Line-scan image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineScanConfig {
    /// Columns kept before the oldest is evicted
    pub max_width: usize,
}

impl Default for LineScanConfig {
    fn default() -> Self {
        Self { max_width: 500 }
    }
}

/// Processor threading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames buffered between acquisition and analysis
    pub frame_queue_capacity: usize,

    /// Recompute spectra every this many analyzed frames
    pub spectrum_interval_frames: usize,

    /// Hold acquisition while the queue is full instead of dropping frames
    pub block_when_full: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: 8,
            spectrum_interval_frames: 10,
            block_when_full: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub spectrum: SpectrumConfig,
    pub line_scan: LineScanConfig,
    pub pipeline: PipelineConfig,
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!("Loaded analysis configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let peaks = &self.spectrum.peaks;
        if !peaks.min_freq.is_finite() || peaks.min_freq < 0.0 {
            return Err(RheedError::Config(format!(
                "peaks.min_freq must be a non-negative number, got {}",
                peaks.min_freq
            )));
        }
        if peaks.min_distance == 0 {
            return Err(RheedError::Config(
                "peaks.min_distance must be at least 1".to_string(),
            ));
        }
        if !peaks.sigma.is_finite() || !peaks.height_floor.is_finite() {
            return Err(RheedError::Config(
                "peaks.sigma and peaks.height_floor must be finite".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.spectrum.time_min, self.spectrum.time_max) {
            if min > max {
                return Err(RheedError::Config(format!(
                    "spectrum.time_min ({}) is after spectrum.time_max ({})",
                    min, max
                )));
            }
        }

        if self.line_scan.max_width == 0 {
            return Err(RheedError::Config(
                "line_scan.max_width must be at least 1".to_string(),
            ));
        }
        if self.pipeline.frame_queue_capacity == 0 {
            return Err(RheedError::Config(
                "pipeline.frame_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.pipeline.spectrum_interval_frames == 0 {
            return Err(RheedError::Config(
                "pipeline.spectrum_interval_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::WindowType;

    #[test]
    fn test_empty_json_is_default() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.line_scan.max_width, 500);
        assert_eq!(config.pipeline.frame_queue_capacity, 8);
        assert_eq!(config.spectrum.peaks.min_distance, 50);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "spectrum": { "window_type": "hann_symmetric", "time_min": 0.0, "peaks": { "min_freq": 0.2 } },
            "pipeline": { "spectrum_interval_frames": 3 }
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();

        assert_eq!(config.spectrum.window_type, WindowType::HannSymmetric);
        assert_eq!(config.spectrum.time_min, Some(0.0));
        assert_eq!(config.spectrum.peaks.min_freq, 0.2);
        assert_eq!(config.spectrum.peaks.sigma, 3.0);
        assert_eq!(config.pipeline.spectrum_interval_frames, 3);
        assert_eq!(config.pipeline.frame_queue_capacity, 8);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "line_scan": { "max_width": 0 } }"#),
            Err(RheedError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "spectrum": { "time_min": 5.0, "time_max": 1.0 } }"#),
            Err(RheedError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str("{ not json"),
            Err(RheedError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AnalysisConfig::default();
        config.spectrum.time_max = Some(30.0);
        let json = config.to_json_string().unwrap();
        assert_eq!(AnalysisConfig::from_json_str(&json).unwrap(), config);
    }
}
