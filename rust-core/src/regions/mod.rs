//! User-drawn regions and their per-frame aggregation

pub mod geometry;
pub mod line_scan;
pub mod region;
pub mod aggregator;

pub use geometry::{BoundingBox, ChannelSelection, LineSegment, RegionId, RegionKind, Shape};
pub use line_scan::LineScanImage;
pub use region::{Region, RegionSet};
pub use aggregator::{aggregate_frame, aggregate_region, AggregatedSample};
