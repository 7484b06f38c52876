//! In-memory frame source for tests and deterministic playback

use std::collections::VecDeque;

use super::properties::PropertyMap;
use super::FrameSource;
use crate::error::Result;
use crate::frame::Frame;

pub struct ReplaySource {
    frames: VecDeque<Frame>,
    properties: PropertyMap,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            properties: PropertyMap::empty(),
        }
    }

    /// Queue another frame at the end
    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Frames left to replay
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn name(&self) -> &str {
        "Replay"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_replays_in_order() {
        let frames =
            (0..3).map(|i| Frame::from_gray(i as f64, Array2::from_elem((2, 2), i as f32)).unwrap());
        let mut source = ReplaySource::new(frames);
        assert_eq!(source.len(), 3);

        let times: Vec<f64> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| f.timestamp())
            .collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert!(source.is_empty());
    }

    #[test]
    fn test_has_no_properties() {
        let mut source = ReplaySource::new(Vec::new());
        assert!(source.get_property("exposure").is_err());
        assert!(source
            .set_property("exposure", crate::camera::PropertyValue::Float(1.0))
            .is_err());
    }
}
