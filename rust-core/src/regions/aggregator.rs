//! Per-frame reduction of regions to samples
//!
//! Rectangles and ellipses reduce to a mean intensity, lines to an intensity
//! profile. A region that cannot produce a value for a frame (outside the
//! image, bad channel, removed) yields no sample instead of failing.

use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};
use ndarray::{s, Array2, Axis};

use super::geometry::{BoundingBox, ChannelSelection, LineSegment, RegionId, RegionKind, Shape};
use super::region::Region;
use crate::frame::Frame;
use crate::series::{Sample, SampleValue};

/// Sample produced by one region for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSample {
    pub region: RegionId,
    pub kind: RegionKind,
    pub sample: Sample,
}

/// Single-channel copy of a window of the frame, averaging channels if
/// requested
fn plane(
    frame: &Frame,
    channel: ChannelSelection,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Option<Array2<f64>> {
    let window = frame.pixels().slice(s![rows, cols, ..]);
    match channel.index() {
        Some(ch) if ch >= frame.channels() => {
            warn!(
                "Channel {} requested from a {}-channel frame",
                ch,
                frame.channels()
            );
            None
        }
        Some(ch) => Some(window.slice(s![.., .., ch]).mapv(f64::from)),
        None => {
            let channels = frame.channels() as f64;
            Some(window.map_axis(Axis(2), |px| {
                px.iter().map(|&v| f64::from(v)).sum::<f64>() / channels
            }))
        }
    }
}

/// Mean intensity inside a box, clipped to the frame
pub fn mean_in_box(frame: &Frame, bbox: &BoundingBox, channel: ChannelSelection) -> Option<f64> {
    let (rows, cols) = bbox.clip(frame.width(), frame.height())?;
    let window = plane(frame, channel, rows, cols)?;
    Some(window.sum() / window.len() as f64)
}

/// Mean intensity inside the ellipse inscribed in `bbox`
///
/// A pixel belongs to the ellipse if its centre does.
pub fn mean_in_ellipse(
    frame: &Frame,
    bbox: &BoundingBox,
    channel: ChannelSelection,
) -> Option<f64> {
    let (rows, cols) = bbox.clip(frame.width(), frame.height())?;
    let window = plane(frame, channel, rows.clone(), cols.clone())?;

    let a = bbox.width as f64 / 2.0;
    let b = bbox.height as f64 / 2.0;
    let cx = bbox.x as f64 + a;
    let cy = bbox.y as f64 + b;

    let mut sum = 0.0;
    let mut count = 0usize;
    for ((r, c), &value) in window.indexed_iter() {
        let dy = ((rows.start + r) as f64 + 0.5 - cy) / b;
        let dx = ((cols.start + c) as f64 + 0.5 - cx) / a;
        if dx * dx + dy * dy <= 1.0 {
            sum += value;
            count += 1;
        }
    }

    if count == 0 {
        debug!("Ellipse covers no pixel centres inside the frame");
        return None;
    }
    Some(sum / count as f64)
}

/// Part of a channel plane whose top-left pixel is `(row0, col0)` in the frame
struct Window {
    image: Array2<f64>,
    row0: usize,
    col0: usize,
    frame_width: usize,
    frame_height: usize,
}

impl Window {
    fn bilinear(&self, x: f64, y: f64) -> Option<f64> {
        let max_x = (self.frame_width - 1) as f64;
        let max_y = (self.frame_height - 1) as f64;
        if !(0.0..=max_x).contains(&x) || !(0.0..=max_y).contains(&y) {
            return None;
        }

        let c0 = x.floor() as usize;
        let r0 = y.floor() as usize;
        let c1 = (c0 + 1).min(self.frame_width - 1);
        let r1 = (r0 + 1).min(self.frame_height - 1);
        let fx = x - c0 as f64;
        let fy = y - r0 as f64;

        let at = |r: usize, c: usize| {
            self.image
                .get([r.checked_sub(self.row0)?, c.checked_sub(self.col0)?])
                .copied()
        };
        let top = at(r0, c0)? * (1.0 - fx) + at(r0, c1)? * fx;
        let bottom = at(r1, c0)? * (1.0 - fx) + at(r1, c1)? * fx;
        Some(top * (1.0 - fy) + bottom * fy)
    }
}

/// Intensity profile along a line
///
/// Samples `round(length) + 1` evenly spaced points with bilinear
/// interpolation; points outside the frame are skipped. Only the visible
/// part of the line is walked, so the cost is bounded by the frame size.
pub fn line_profile(
    frame: &Frame,
    line: &LineSegment,
    channel: ChannelSelection,
) -> Option<Vec<f64>> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return None;
    }
    let Some((t0, t1)) = line.clip((width - 1) as f64, (height - 1) as f64) else {
        debug!("Line lies entirely outside the frame");
        return None;
    };

    let n = line.sample_count();
    let steps = (n.max(2) - 1) as f64;
    // One extra index on each side absorbs rounding in the clip parameters
    let first = ((t0 * steps).floor() as usize).saturating_sub(1);
    let last = ((t1 * steps).ceil() as usize).saturating_add(1).min(n - 1);

    let (ax, ay) = line.point_at(t0);
    let (bx, by) = line.point_at(t1);
    let bound = |lo: f64, hi: f64, size: usize| {
        let start = (lo.floor() as usize).saturating_sub(1).min(size);
        let end = (hi.ceil() as usize).saturating_add(2).min(size);
        start..end
    };
    let rows = bound(ay.min(by), ay.max(by), height);
    let cols = bound(ax.min(bx), ax.max(bx), width);
    let window = Window {
        row0: rows.start,
        col0: cols.start,
        image: plane(frame, channel, rows, cols)?,
        frame_width: width,
        frame_height: height,
    };

    let profile: Vec<f64> = (first..=last)
        .filter_map(|i| {
            let (x, y) = line.point_at(i as f64 / steps);
            window.bilinear(x, y)
        })
        .collect();

    if profile.is_empty() {
        debug!("Line lies entirely outside the frame");
        return None;
    }
    Some(profile)
}

/// Reduce a shape over one frame
pub fn reduce(frame: &Frame, shape: &Shape, channel: ChannelSelection) -> Option<SampleValue> {
    match shape {
        Shape::Rectangle(bbox) => mean_in_box(frame, bbox, channel).map(SampleValue::Scalar),
        Shape::Ellipse(bbox) => mean_in_ellipse(frame, bbox, channel).map(SampleValue::Scalar),
        Shape::Line(line) => line_profile(frame, line, channel).map(SampleValue::Profile),
    }
}

/// Aggregate one region over a frame and store the result
///
/// Appends to the region's series and, for lines, pushes the profile into
/// its line scan.
///
/// # Returns
/// The stored sample, or `None` if the region produced nothing for this frame
pub fn aggregate_region(frame: &Frame, region: &Region) -> Option<Sample> {
    if region.is_removed() {
        debug!("Skipping removed region '{}'", region.id());
        return None;
    }
    let shape = region.shape()?;
    let Some(value) = reduce(frame, &shape, region.channel()) else {
        debug!(
            "Region '{}' produced no sample at t={}",
            region.id(),
            frame.timestamp()
        );
        return None;
    };

    let sample = Sample {
        timestamp: frame.timestamp(),
        value,
    };
    if !region.series().append(sample.clone()) {
        return None;
    }
    if let SampleValue::Profile(profile) = &sample.value {
        region.push_line_scan(profile.clone());
    }
    Some(sample)
}

/// Aggregate every region over a frame
pub fn aggregate_frame(frame: &Frame, regions: &[Arc<Region>]) -> Vec<AggregatedSample> {
    regions
        .iter()
        .filter_map(|region| {
            aggregate_region(frame, region).map(|sample| AggregatedSample {
                region: region.id().clone(),
                kind: region.kind(),
                sample,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn ramp_frame(timestamp: f64) -> Frame {
        // Intensity equals the column index
        let pixels = Array2::from_shape_fn((10, 10), |(_, c)| c as f32);
        Frame::from_gray(timestamp, pixels).unwrap()
    }

    fn region(id: &str, shape: Shape) -> Region {
        Region::new(RegionId::from(id), shape, ChannelSelection::Mean, 4).unwrap()
    }

    #[test]
    fn test_rectangle_mean() {
        let frame = ramp_frame(0.0);
        let bbox = BoundingBox::new(2, 0, 3, 5);
        // Columns 2, 3, 4
        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Mean), Some(3.0));
    }

    #[test]
    fn test_rectangle_clipped_to_frame() {
        let frame = ramp_frame(0.0);
        let bbox = BoundingBox::new(8, 8, 10, 10);
        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Mean), Some(8.5));
    }

    #[test]
    fn test_rectangle_outside_frame_yields_no_sample() {
        let frame = ramp_frame(0.0);
        let outside = region("red", Shape::Rectangle(BoundingBox::new(20, 20, 5, 5)));

        assert!(aggregate_region(&frame, &outside).is_none());
        assert!(outside.series().is_empty());
    }

    #[test]
    fn test_ellipse_is_symmetric() {
        let frame = ramp_frame(0.0);
        let bbox = BoundingBox::new(2, 2, 5, 5);
        // Pixel centres 2.5..6.5 are symmetric about column 4
        let mean = mean_in_ellipse(&frame, &bbox, ChannelSelection::Mean).unwrap();
        assert!((mean - 4.0).abs() < 1e-12);

        let uniform = Frame::from_gray(0.0, Array2::from_elem((10, 10), 7.0)).unwrap();
        assert_eq!(
            mean_in_ellipse(&uniform, &bbox, ChannelSelection::Mean),
            Some(7.0)
        );
    }

    #[test]
    fn test_line_profile_interpolates() {
        let frame = ramp_frame(0.0);
        let line = LineSegment::new(0.0, 5.0, 4.0, 5.0);
        let profile = line_profile(&frame, &line, ChannelSelection::Mean).unwrap();
        assert_eq!(profile, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        let diagonal = LineSegment::new(0.5, 0.5, 3.5, 4.5);
        let profile = line_profile(&frame, &diagonal, ChannelSelection::Mean).unwrap();
        assert_eq!(profile.len(), 6);
        assert!((profile[0] - 0.5).abs() < 1e-12);
        assert!((profile[5] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_line_points_outside_are_skipped() {
        let frame = ramp_frame(0.0);
        let line = LineSegment::new(5.0, 2.0, 14.0, 2.0);
        let profile = line_profile(&frame, &line, ChannelSelection::Mean).unwrap();
        assert_eq!(profile, vec![5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_long_line_only_walks_visible_part() {
        let frame = ramp_frame(0.0);
        let long = LineSegment::new(0.0, 2.0, 1e9, 2.0);
        let profile = line_profile(&frame, &long, ChannelSelection::Mean).unwrap();
        assert!((9..=10).contains(&profile.len()));
        for (k, value) in profile.iter().enumerate() {
            assert!((value - k as f64).abs() < 1e-6);
        }

        let huge = LineSegment::new(-1e30, 2.0, 1e30, 2.0);
        assert!(line_profile(&frame, &huge, ChannelSelection::Mean).map_or(0, |p| p.len()) <= 3);

        let missing = LineSegment::new(-1e9, 20.0, 1e9, 20.0);
        assert!(line_profile(&frame, &missing, ChannelSelection::Mean).is_none());
    }

    #[test]
    fn test_window_offsets_match_full_frame() {
        // Distinct value per pixel so an offset error changes the result
        let pixels = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f32);
        let frame = Frame::from_gray(0.0, pixels).unwrap();

        let bbox = BoundingBox::new(3, 4, 2, 2);
        // Pixels 43, 44, 53, 54
        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Mean), Some(48.5));

        let line = LineSegment::new(6.0, 7.0, 6.0, 9.0);
        let profile = line_profile(&frame, &line, ChannelSelection::Mean).unwrap();
        assert_eq!(profile, vec![76.0, 86.0, 96.0]);

        let diagonal = LineSegment::new(7.5, 1.5, 9.0, 3.0);
        let profile = line_profile(&frame, &diagonal, ChannelSelection::Mean).unwrap();
        assert!((profile[0] - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_channel_selection() {
        let mut pixels = Array3::<f32>::zeros((4, 4, 3));
        pixels.slice_mut(s![.., .., 1]).fill(9.0);
        let frame = Frame::new(0.0, pixels).unwrap();
        let bbox = BoundingBox::new(0, 0, 4, 4);

        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Mean), Some(3.0));
        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Index(1)), Some(9.0));
        assert_eq!(mean_in_box(&frame, &bbox, ChannelSelection::Index(3)), None);
    }

    #[test]
    fn test_aggregate_line_feeds_series_and_line_scan() {
        let red = Arc::new(region("red", Shape::Line(LineSegment::new(0.0, 0.0, 3.0, 0.0))));
        let blue = Arc::new(region("blue", Shape::Rectangle(BoundingBox::new(0, 0, 2, 2))));
        let regions = vec![Arc::clone(&blue), Arc::clone(&red)];

        for i in 0..6 {
            let samples = aggregate_frame(&ramp_frame(i as f64), &regions);
            assert_eq!(samples.len(), 2);
        }

        assert_eq!(red.series().len(), 6);
        assert_eq!(red.series().latest_profile(), Some(vec![0.0, 1.0, 2.0, 3.0]));
        let scan = red.line_scan().unwrap();
        assert_eq!(scan.width(), 4);
        assert_eq!(scan.height(), Some(4));

        let snapshot = blue.series().snapshot().unwrap();
        assert_eq!(snapshot.values, vec![0.5; 6]);
    }

    #[test]
    fn test_removed_region_is_skipped() {
        let set = crate::regions::RegionSet::new();
        let held = set
            .add(region("red", Shape::Rectangle(BoundingBox::new(0, 0, 2, 2))))
            .unwrap();
        set.remove(&RegionId::from("red")).unwrap();

        assert!(aggregate_frame(&ramp_frame(0.0), &[held]).is_empty());
    }
}
