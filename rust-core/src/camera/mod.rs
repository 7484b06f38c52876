//! Frame sources and their controls

pub mod properties;
pub mod registry;
pub mod synthetic;
pub mod replay;

use std::collections::VecDeque;

use crate::error::Result;
use crate::frame::Frame;

pub use properties::{PropertyDescriptor, PropertyKind, PropertyMap, PropertyValue};
pub use registry::{camera_kinds, open_camera, CameraConfig, CameraEntry, CAMERA_REGISTRY};
pub use replay::ReplaySource;
pub use synthetic::SyntheticCamera;

/// Anything that yields camera frames on demand
pub trait FrameSource: Send {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn properties(&self) -> &PropertyMap;

    fn properties_mut(&mut self) -> &mut PropertyMap;

    fn get_property(&self, name: &str) -> Result<PropertyValue> {
        self.properties().get(name)
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        self.properties_mut().set(name, value)
    }
}

const RATE_WINDOW: usize = 60;

/// Measured acquisition rate from recent frame times
#[derive(Debug, Clone, Default)]
pub struct FrameRateMeter {
    times: VecDeque<f64>,
}

impl FrameRateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame time in seconds
    pub fn record(&mut self, time: f64) {
        if self.times.len() == RATE_WINDOW {
            self.times.pop_front();
        }
        self.times.push_back(time);
    }

    /// Frames per second
    ///
    /// Zero until two frames are seen. With fewer than 60 frames the span is
    /// taken as at least one second, so early estimates err low.
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.times.front(), self.times.back()) else {
            return 0.0;
        };
        let count = self.times.len();
        if count <= 1 {
            return 0.0;
        }

        let span = last - first;
        if count < RATE_WINDOW {
            count as f64 / span.max(1.0)
        } else if span > 0.0 {
            RATE_WINDOW as f64 / span
        } else {
            0.0
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn reset(&mut self) {
        self.times.clear();
    }
}
