//! Camera frames as timestamped pixel arrays

use ndarray::{Array2, Array3, Axis};

use crate::error::{Result, RheedError};

/// One camera frame
///
/// Pixels are stored as `(rows, cols, channels)` intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    timestamp: f64,
    pixels: Array3<f32>,
}

impl Frame {
    /// Create a frame from a pixel array
    ///
    /// # Arguments
    /// * `timestamp` - Acquisition time in seconds
    /// * `pixels` - Intensities shaped `(rows, cols, channels)`
    pub fn new(timestamp: f64, pixels: Array3<f32>) -> Result<Self> {
        if !timestamp.is_finite() {
            return Err(RheedError::InvalidFrame(format!(
                "timestamp {} is not finite",
                timestamp
            )));
        }
        if pixels.is_empty() {
            return Err(RheedError::InvalidFrame(format!(
                "frame has no pixels (shape {:?})",
                pixels.shape()
            )));
        }
        Ok(Self { timestamp, pixels })
    }

    /// Create a single-channel frame
    pub fn from_gray(timestamp: f64, pixels: Array2<f32>) -> Result<Self> {
        Self::new(timestamp, pixels.insert_axis(Axis(2)))
    }

    /// Create a single-channel frame from a row-major 8-bit buffer
    pub fn from_gray_u8(timestamp: f64, width: usize, height: usize, data: &[u8]) -> Result<Self> {
        if data.len() != width * height {
            return Err(RheedError::InvalidFrame(format!(
                "expected {}x{} = {} bytes, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        let pixels = Array3::from_shape_fn((height, width, 1), |(r, c, _)| {
            f32::from(data[r * width + c])
        });
        Self::new(timestamp, pixels)
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    pub fn pixels(&self) -> &Array3<f32> {
        &self.pixels
    }

    /// Intensity at `(row, col)`: one channel, or the mean over channels
    ///
    /// # Returns
    /// `None` if the position or channel is out of range
    pub fn intensity(&self, row: usize, col: usize, channel: Option<usize>) -> Option<f64> {
        match channel {
            Some(ch) => self.pixels.get((row, col, ch)).map(|&v| f64::from(v)),
            None => {
                if row >= self.height() || col >= self.width() {
                    return None;
                }
                let sum: f64 = (0..self.channels())
                    .map(|ch| f64::from(self.pixels[[row, col, ch]]))
                    .sum();
                Some(sum / self.channels() as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dimensions() {
        let frame = Frame::new(0.5, Array3::zeros((4, 6, 3))).unwrap();
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.width(), 6);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.timestamp(), 0.5);
    }

    #[test]
    fn test_empty_frame_rejected() {
        assert!(Frame::new(0.0, Array3::zeros((0, 6, 1))).is_err());
        assert!(Frame::new(f64::NAN, Array3::zeros((2, 2, 1))).is_err());
    }

    #[test]
    fn test_from_gray_u8() {
        let data = [0u8, 1, 2, 3, 4, 5];
        let frame = Frame::from_gray_u8(1.0, 3, 2, &data).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.intensity(1, 2, None), Some(5.0));
        assert!(Frame::from_gray_u8(1.0, 3, 3, &data).is_err());
    }

    #[test]
    fn test_channel_intensity() {
        let mut pixels = Array3::<f32>::zeros((1, 1, 3));
        pixels[[0, 0, 0]] = 3.0;
        pixels[[0, 0, 1]] = 6.0;
        pixels[[0, 0, 2]] = 9.0;
        let frame = Frame::new(0.0, pixels).unwrap();

        assert_eq!(frame.intensity(0, 0, None), Some(6.0));
        assert_eq!(frame.intensity(0, 0, Some(2)), Some(9.0));
        assert_eq!(frame.intensity(0, 0, Some(3)), None);
        assert_eq!(frame.intensity(1, 0, None), None);
    }
}
