//! Region identities and shapes in pixel coordinates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RheedError};

/// Stable key of a region (typically the color it is drawn with)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Rectangle,
    Ellipse,
    Line,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Rectangle => "rectangle",
            RegionKind::Ellipse => "ellipse",
            RegionKind::Line => "line",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box; `(x, y)` is the top-left pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Pixel count, or `None` if it does not fit in an `i64`
    pub fn area(&self) -> Option<i64> {
        self.width.max(0).checked_mul(self.height.max(0))
    }

    /// Intersect with a `frame_width` x `frame_height` image
    ///
    /// # Returns
    /// `(row_range, col_range)`, or `None` if nothing overlaps
    pub fn clip(
        &self,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let clamp = |v: i64, hi: usize| v.clamp(0, hi as i64) as usize;

        let col_start = clamp(self.x, frame_width);
        let col_end = clamp(self.x.saturating_add(self.width), frame_width);
        let row_start = clamp(self.y, frame_height);
        let row_end = clamp(self.y.saturating_add(self.height), frame_height);

        if col_start >= col_end || row_start >= row_end {
            return None;
        }
        Some((row_start..row_end, col_start..col_end))
    }
}

/// Longest line accepted as a region, in pixels
pub const MAX_LINE_LENGTH: f64 = u32::MAX as f64;

/// Straight line from `(x0, y0)` to `(x1, y1)` in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LineSegment {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn length(&self) -> f64 {
        (self.x1 - self.x0).hypot(self.y1 - self.y0)
    }

    /// Number of unit-spaced samples along the line
    pub fn sample_count(&self) -> usize {
        (self.length().round() as usize).saturating_add(1)
    }

    /// Point at parameter `t`, where 0 is the start and 1 the end
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        (
            self.x0 + t * (self.x1 - self.x0),
            self.y0 + t * (self.y1 - self.y0),
        )
    }

    /// Liang-Barsky clip against `[0, max_x] x [0, max_y]`
    ///
    /// # Returns
    /// The parameter range `(t0, t1)` of the visible part, or `None` if the
    /// line misses the rectangle
    pub fn clip(&self, max_x: f64, max_y: f64) -> Option<(f64, f64)> {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        for (p, q) in [
            (-dx, self.x0),
            (dx, max_x - self.x0),
            (-dy, self.y0),
            (dy, max_y - self.y0),
        ] {
            if p == 0.0 {
                // Parallel to this edge
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

/// Geometry of a user-drawn region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(BoundingBox),
    Ellipse(BoundingBox),
    Line(LineSegment),
}

impl Shape {
    pub fn kind(&self) -> RegionKind {
        match self {
            Shape::Rectangle(_) => RegionKind::Rectangle,
            Shape::Ellipse(_) => RegionKind::Ellipse,
            Shape::Line(_) => RegionKind::Line,
        }
    }

    /// Reject shapes that cannot produce a sample on any frame
    pub fn validate(&self, id: &RegionId) -> Result<()> {
        match self {
            Shape::Rectangle(bbox) | Shape::Ellipse(bbox) => {
                if bbox.width <= 0 || bbox.height <= 0 {
                    return Err(RheedError::EmptyRegion(id.to_string()));
                }
                if bbox.area().is_none() {
                    return Err(RheedError::InvalidGeometry {
                        region: id.to_string(),
                        reason: format!("{} x {} box is too large", bbox.width, bbox.height),
                    });
                }
            }
            Shape::Line(line) => {
                let coords = [line.x0, line.y0, line.x1, line.y1];
                if coords.iter().any(|c| !c.is_finite()) {
                    return Err(RheedError::InvalidGeometry {
                        region: id.to_string(),
                        reason: "line endpoints must be finite".to_string(),
                    });
                }
                let length = line.length();
                if length == 0.0 {
                    return Err(RheedError::EmptyRegion(id.to_string()));
                }
                if length > MAX_LINE_LENGTH {
                    return Err(RheedError::InvalidGeometry {
                        region: id.to_string(),
                        reason: format!("line length {} exceeds {}", length, MAX_LINE_LENGTH),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Which color channel a region averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelection {
    /// Mean over all channels
    #[default]
    Mean,

    /// A single channel index
    Index(usize),
}

impl ChannelSelection {
    pub fn index(&self) -> Option<usize> {
        match self {
            ChannelSelection::Mean => None,
            ChannelSelection::Index(ch) => Some(*ch),
        }
    }
}
