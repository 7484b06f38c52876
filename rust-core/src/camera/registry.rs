//! Static table of camera kinds that can be opened by tag

use log::info;
use serde::{Deserialize, Serialize};

use super::replay::ReplaySource;
use super::synthetic::SyntheticCamera;
use super::FrameSource;
use crate::error::{Result, RheedError};

/// Parameters used when opening a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: usize,
    pub height: usize,

    /// Frames per second (virtual for the synthetic camera)
    pub frame_rate: f64,

    /// Specular oscillation frequency of the synthetic pattern (Hz)
    pub growth_frequency: f64,

    /// Relative depth of the synthetic oscillation, 0 to 1
    pub oscillation_amplitude: f64,

    /// Stop after this many frames
    pub frame_limit: Option<usize>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frame_rate: 30.0,
            growth_frequency: 0.5,
            oscillation_amplitude: 0.5,
            frame_limit: None,
        }
    }
}

type Constructor = fn(&CameraConfig) -> Result<Box<dyn FrameSource>>;

/// One openable camera kind
pub struct CameraEntry {
    pub tag: &'static str,
    pub description: &'static str,
    constructor: Constructor,
}

impl CameraEntry {
    pub fn open(&self, config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
        (self.constructor)(config)
    }
}

fn open_synthetic(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(SyntheticCamera::new(config)?))
}

fn open_replay(_config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(ReplaySource::new(Vec::new())))
}

pub static CAMERA_REGISTRY: &[CameraEntry] = &[
    CameraEntry {
        tag: "synthetic",
        description: "Simulated RHEED pattern with an oscillating specular spot",
        constructor: open_synthetic,
    },
    CameraEntry {
        tag: "replay",
        description: "In-memory frame replay",
        constructor: open_replay,
    },
];

/// Every registered camera kind
pub fn camera_kinds() -> impl Iterator<Item = &'static CameraEntry> {
    CAMERA_REGISTRY.iter()
}

/// Open a camera by registry tag
///
/// # Errors
/// `UnknownCameraKind` if no entry has this tag
pub fn open_camera(tag: &str, config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    let entry = CAMERA_REGISTRY
        .iter()
        .find(|entry| entry.tag.eq_ignore_ascii_case(tag))
        .ok_or_else(|| RheedError::UnknownCameraKind(tag.to_string()))?;

    let source = entry.open(config)?;
    info!("Opened '{}' camera: {}", entry.tag, source.name());
    Ok(source)
}
