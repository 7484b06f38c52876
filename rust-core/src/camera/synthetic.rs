//! Synthetic RHEED camera
//!
//! Renders a fixed diffraction pattern (background, two side streaks and a
//! specular spot) whose specular intensity oscillates at the growth
//! frequency, the way layer-by-layer growth modulates a real pattern.
//! Timestamps come from a virtual clock advancing by `1 / frame_rate` per
//! frame, so output is fully deterministic.

use std::f64::consts::PI;

use log::info;
use ndarray::Array2;

use super::properties::{PropertyDescriptor, PropertyKind, PropertyMap, PropertyValue};
use super::registry::CameraConfig;
use super::FrameSource;
use crate::error::{Result, RheedError};
use crate::frame::Frame;

const BACKGROUND: f64 = 10.0;
const STREAK_PEAK: f64 = 40.0;
const SPOT_PEAK: f64 = 120.0;
const FULL_SCALE: f64 = 255.0;

pub static SYNTHETIC_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor {
        name: "width",
        kind: PropertyKind::Int,
        default: PropertyValue::Int(0),
        min: None,
        max: None,
        writable: false,
        description: "Frame width in pixels",
    },
    PropertyDescriptor {
        name: "height",
        kind: PropertyKind::Int,
        default: PropertyValue::Int(0),
        min: None,
        max: None,
        writable: false,
        description: "Frame height in pixels",
    },
    PropertyDescriptor {
        name: "exposure",
        kind: PropertyKind::Float,
        default: PropertyValue::Float(1.0),
        min: Some(0.01),
        max: Some(10.0),
        writable: true,
        description: "Exposure scale applied to the whole image",
    },
    PropertyDescriptor {
        name: "gain",
        kind: PropertyKind::Float,
        default: PropertyValue::Float(1.0),
        min: Some(0.1),
        max: Some(10.0),
        writable: true,
        description: "Linear gain",
    },
    PropertyDescriptor {
        name: "frame_rate",
        kind: PropertyKind::Float,
        default: PropertyValue::Float(30.0),
        min: Some(0.1),
        max: Some(1000.0),
        writable: true,
        description: "Virtual frames per second",
    },
    PropertyDescriptor {
        name: "growth_frequency",
        kind: PropertyKind::Float,
        default: PropertyValue::Float(0.5),
        min: Some(0.0),
        max: Some(500.0),
        writable: true,
        description: "Oscillation frequency of the specular spot (Hz)",
    },
    PropertyDescriptor {
        name: "oscillation_amplitude",
        kind: PropertyKind::Float,
        default: PropertyValue::Float(0.5),
        min: Some(0.0),
        max: Some(1.0),
        writable: true,
        description: "Relative depth of the specular oscillation",
    },
    PropertyDescriptor {
        name: "frame_count",
        kind: PropertyKind::Int,
        default: PropertyValue::Int(0),
        min: None,
        max: None,
        writable: false,
        description: "Frames produced since the camera was opened",
    },
];

fn gaussian(d2: f64, sigma: f64) -> f64 {
    (-d2 / (2.0 * sigma * sigma)).exp()
}

pub struct SyntheticCamera {
    name: String,
    properties: PropertyMap,

    /// Static part of the pattern
    base: Array2<f64>,

    /// Unit-height specular spot
    spot: Array2<f64>,

    clock: f64,
    produced: usize,
    frame_limit: Option<usize>,
}

impl SyntheticCamera {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let (width, height) = (config.width, config.height);
        if width == 0 || height == 0 {
            return Err(RheedError::Camera(format!(
                "synthetic camera needs a non-empty frame, got {}x{}",
                width, height
            )));
        }

        let mut properties = PropertyMap::new(SYNTHETIC_PROPERTIES);
        properties.set_internal("width", PropertyValue::Int(width as i64))?;
        properties.set_internal("height", PropertyValue::Int(height as i64))?;
        properties.set("frame_rate", PropertyValue::Float(config.frame_rate))?;
        properties.set("growth_frequency", PropertyValue::Float(config.growth_frequency))?;
        properties.set(
            "oscillation_amplitude",
            PropertyValue::Float(config.oscillation_amplitude),
        )?;

        let (spot_col, spot_row) = Self::spot_center(width, height);
        let sigma = (width.min(height) as f64 / 20.0).max(1.0);
        let streak_offset = width as f64 / 6.0;

        let base = Array2::from_shape_fn((height, width), |(r, c)| {
            let c = c as f64;
            let left = gaussian((c - (spot_col - streak_offset)).powi(2), sigma);
            let right = gaussian((c - (spot_col + streak_offset)).powi(2), sigma);
            // Streaks fade towards the top of the screen
            let fade = r as f64 / height as f64;
            BACKGROUND + STREAK_PEAK * fade * (left + right)
        });
        let spot = Array2::from_shape_fn((height, width), |(r, c)| {
            let d2 = (c as f64 - spot_col).powi(2) + (r as f64 - spot_row).powi(2);
            gaussian(d2, sigma)
        });

        info!("Opened synthetic camera ({}x{})", width, height);

        Ok(Self {
            name: format!("Synthetic ({}x{})", width, height),
            properties,
            base,
            spot,
            clock: 0.0,
            produced: 0,
            frame_limit: config.frame_limit,
        })
    }

    /// Pixel position `(col, row)` of the specular spot
    pub fn spot_center(width: usize, height: usize) -> (f64, f64) {
        ((width / 2) as f64, (height * 3 / 10) as f64)
    }

    /// Specular intensity scale at time `t`
    fn spot_level(&self, t: f64) -> Result<f64> {
        let frequency = self.properties.get_f64("growth_frequency")?;
        let amplitude = self.properties.get_f64("oscillation_amplitude")?;
        Ok(SPOT_PEAK * (1.0 + amplitude * (2.0 * PI * frequency * t).cos()))
    }

    fn render(&self, t: f64) -> Result<Array2<f32>> {
        let scale = self.properties.get_f64("exposure")? * self.properties.get_f64("gain")?;
        let level = self.spot_level(t)?;

        let mut image = Array2::<f32>::zeros(self.base.dim());
        ndarray::Zip::from(&mut image)
            .and(&self.base)
            .and(&self.spot)
            .for_each(|px, &base, &spot| {
                *px = ((base + level * spot) * scale).clamp(0.0, FULL_SCALE) as f32;
            });
        Ok(image)
    }
}

impl FrameSource for SyntheticCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frame_limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }

        let t = self.clock;
        let frame = Frame::from_gray(t, self.render(t)?)?;

        self.produced += 1;
        self.clock += 1.0 / self.properties.get_f64("frame_rate")?;
        self.properties
            .set_internal("frame_count", PropertyValue::Int(self.produced as i64))?;
        Ok(Some(frame))
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

    fn config() -> CameraConfig {
        CameraConfig {
            width: 40,
            height: 30,
            frame_rate: 10.0,
            growth_frequency: 1.0,
            oscillation_amplitude: 0.5,
            frame_limit: Some(25),
        }
    }

    #[test]
    fn test_virtual_clock_and_limit() {
        let mut camera = SyntheticCamera::new(&config()).unwrap();
        let mut times = Vec::new();
        while let Some(frame) = camera.next_frame().unwrap() {
            assert_eq!((frame.width(), frame.height()), (40, 30));
            times.push(frame.timestamp());
        }

        assert_eq!(times.len(), 25);
        assert_eq!(times[0], 0.0);
        assert!((times[10] - 1.0).abs() < 1e-9);
        assert_eq!(camera.get_property("frame_count").unwrap(), PropertyValue::Int(25));
    }

    #[test]
    fn test_spot_oscillates() {
        let mut camera = SyntheticCamera::new(&config()).unwrap();
        let (col, row) = SyntheticCamera::spot_center(40, 30);
        let (col, row) = (col as usize, row as usize);

        let mut spot = Vec::new();
        for _ in 0..10 {
            let frame = camera.next_frame().unwrap().unwrap();
            spot.push(frame.intensity(row, col, None).unwrap());
        }

        // t = 0 is the crest, t = 0.5 s the trough of a 1 Hz oscillation
        assert!(spot[0] > spot[5]);
        assert!((spot[0] - (BACKGROUND + SPOT_PEAK * 1.5)).abs() < 1.0);
        assert!((spot[5] - (BACKGROUND + SPOT_PEAK * 0.5)).abs() < 1.0);
    }

    #[test]
    fn test_property_changes_apply() {
        let mut camera = SyntheticCamera::new(&config()).unwrap();
        let before = camera.next_frame().unwrap().unwrap();

        camera.set_property("exposure", PropertyValue::Float(0.5)).unwrap();
        camera.set_property("oscillation_amplitude", PropertyValue::Float(0.0)).unwrap();
        let after = camera.next_frame().unwrap().unwrap();

        assert!(after.intensity(0, 0, None).unwrap() < before.intensity(0, 0, None).unwrap());
        assert!(camera.set_property("width", PropertyValue::Int(10)).is_err());
    }

    #[test]
    fn test_rejects_empty_frame_size() {
        let config = CameraConfig {
            width: 0,
            ..config()
        };
        assert!(SyntheticCamera::new(&config).is_err());
    }
}
