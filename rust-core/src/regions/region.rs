//! Regions and the shared set the processor aggregates over

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, info};

use super::geometry::{ChannelSelection, RegionId, RegionKind, Shape};
use super::line_scan::LineScanImage;
use crate::error::{Result, RheedError};
use crate::series::SharedSeries;

/// A user-drawn region with its series and (for lines) its line scan
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    kind: RegionKind,
    shape: RwLock<Shape>,
    channel: ChannelSelection,
    series: SharedSeries,
    line_scan: Option<Mutex<LineScanImage>>,
    removed: AtomicBool,
}

impl Region {
    /// Create a region after validating its geometry
    ///
    /// # Arguments
    /// * `id` - Stable key
    /// * `shape` - Geometry in pixel coordinates
    /// * `channel` - Channel the aggregator reads
    /// * `line_scan_width` - Column capacity of the line scan (lines only)
    pub fn new(
        id: RegionId,
        shape: Shape,
        channel: ChannelSelection,
        line_scan_width: usize,
    ) -> Result<Self> {
        shape.validate(&id)?;
        let kind = shape.kind();
        let line_scan = (kind == RegionKind::Line)
            .then(|| Mutex::new(LineScanImage::new(line_scan_width)));

        Ok(Self {
            id,
            kind,
            shape: RwLock::new(shape),
            channel,
            series: SharedSeries::new(),
            line_scan,
            removed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Current geometry, or `None` if the lock is poisoned
    pub fn shape(&self) -> Option<Shape> {
        self.shape.read().ok().map(|s| *s)
    }

    pub fn channel(&self) -> ChannelSelection {
        self.channel
    }

    pub fn series(&self) -> &SharedSeries {
        &self.series
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Replace the geometry; the kind cannot change
    pub fn set_shape(&self, shape: Shape) -> Result<()> {
        if shape.kind() != self.kind {
            return Err(RheedError::InvalidGeometry {
                region: self.id.to_string(),
                reason: format!("cannot turn a {} into a {}", self.kind, shape.kind()),
            });
        }
        shape.validate(&self.id)?;

        let mut guard = self
            .shape
            .write()
            .map_err(|_| RheedError::UnknownRegion(self.id.to_string()))?;
        *guard = shape;
        Ok(())
    }

    /// Push a profile into the line scan
    ///
    /// # Returns
    /// `false` if this is not a line region or it has been removed
    pub fn push_line_scan(&self, profile: Vec<f64>) -> bool {
        let Some(line_scan) = &self.line_scan else {
            return false;
        };
        let Ok(mut image) = line_scan.lock() else {
            return false;
        };
        // Checked under the image lock so a removal cannot be undone
        if self.is_removed() {
            return false;
        }
        image.push_column(profile);
        true
    }

    /// Copy of the line-scan image (lines only)
    pub fn line_scan(&self) -> Option<LineScanImage> {
        let image = self.line_scan.as_ref()?.lock().ok()?;
        Some(image.clone())
    }

    /// Discard all state; every later append or push is refused
    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::SeqCst);
        self.series.close();
        if let Some(line_scan) = &self.line_scan {
            if let Ok(mut image) = line_scan.lock() {
                image.clear();
            }
        }
    }
}

/// Thread-shared collection of active regions
#[derive(Debug, Default)]
pub struct RegionSet {
    regions: RwLock<HashMap<RegionId, Arc<Region>>>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region
    ///
    /// # Errors
    /// `DuplicateRegion` if the id is taken
    pub fn add(&self, region: Region) -> Result<Arc<Region>> {
        let mut regions = self
            .regions
            .write()
            .map_err(|_| RheedError::DuplicateRegion(region.id.to_string()))?;
        if regions.contains_key(&region.id) {
            return Err(RheedError::DuplicateRegion(region.id.to_string()));
        }

        info!("Added {} region '{}'", region.kind, region.id);
        let region = Arc::new(region);
        regions.insert(region.id.clone(), Arc::clone(&region));
        Ok(region)
    }

    /// Remove a region and discard its state
    ///
    /// Work already holding the region sees it as removed and stores nothing.
    pub fn remove(&self, id: &RegionId) -> Result<Arc<Region>> {
        let removed = self
            .regions
            .write()
            .ok()
            .and_then(|mut regions| regions.remove(id))
            .ok_or_else(|| RheedError::UnknownRegion(id.to_string()))?;

        removed.mark_removed();
        info!("Removed region '{}'", id);
        Ok(removed)
    }

    /// Change a region's geometry in place
    pub fn update_shape(&self, id: &RegionId, shape: Shape) -> Result<()> {
        let region = self
            .get(id)
            .ok_or_else(|| RheedError::UnknownRegion(id.to_string()))?;
        region.set_shape(shape)?;
        debug!("Updated shape of region '{}'", id);
        Ok(())
    }

    pub fn get(&self, id: &RegionId) -> Option<Arc<Region>> {
        self.regions.read().ok()?.get(id).cloned()
    }

    /// Snapshot of the active regions, sorted by id
    pub fn active(&self) -> Vec<Arc<Region>> {
        let Ok(regions) = self.regions.read() else {
            return Vec::new();
        };
        let mut active: Vec<Arc<Region>> = regions.values().cloned().collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.active().iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every region
    pub fn clear(&self) -> Vec<RegionId> {
        let drained: Vec<Arc<Region>> = match self.regions.write() {
            Ok(mut regions) => regions.drain().map(|(_, r)| r).collect(),
            Err(_) => Vec::new(),
        };
        drained
            .into_iter()
            .map(|region| {
                region.mark_removed();
                region.id.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::geometry::{BoundingBox, LineSegment};
    use crate::series::Sample;

    fn rectangle(id: &str) -> Region {
        Region::new(
            RegionId::from(id),
            Shape::Rectangle(BoundingBox::new(0, 0, 4, 4)),
            ChannelSelection::Mean,
            10,
        )
        .unwrap()
    }

    fn line(id: &str) -> Region {
        Region::new(
            RegionId::from(id),
            Shape::Line(LineSegment::new(0.0, 0.0, 5.0, 0.0)),
            ChannelSelection::Mean,
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let set = RegionSet::new();
        set.add(rectangle("red")).unwrap();
        assert!(matches!(
            set.add(rectangle("red")),
            Err(RheedError::DuplicateRegion(_))
        ));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_invalid_geometry_rejected_at_definition() {
        let result = Region::new(
            RegionId::from("blue"),
            Shape::Ellipse(BoundingBox::new(3, 3, 0, 0)),
            ChannelSelection::Mean,
            10,
        );
        assert!(matches!(result, Err(RheedError::EmptyRegion(_))));
    }

    #[test]
    fn test_active_sorted_by_id() {
        let set = RegionSet::new();
        set.add(rectangle("green")).unwrap();
        set.add(rectangle("blue")).unwrap();
        set.add(line("red")).unwrap();

        let ids: Vec<String> = set.ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["blue", "green", "red"]);
    }

    #[test]
    fn test_remove_closes_series_held_elsewhere() {
        let set = RegionSet::new();
        let held = set.add(line("red")).unwrap();
        held.series().append(Sample::scalar(0.0, 1.0));
        held.push_line_scan(vec![1.0; 6]);

        set.remove(&RegionId::from("red")).unwrap();

        assert!(held.is_removed());
        assert!(held.series().snapshot().is_none());
        assert!(!held.series().append(Sample::scalar(1.0, 1.0)));
        assert!(!held.push_line_scan(vec![1.0; 6]));
        assert!(held.line_scan().unwrap().is_empty());
        assert!(set.get(&RegionId::from("red")).is_none());
    }

    #[test]
    fn test_remove_unknown_region() {
        let set = RegionSet::new();
        assert!(matches!(
            set.remove(&RegionId::from("nope")),
            Err(RheedError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_update_shape_keeps_kind() {
        let set = RegionSet::new();
        set.add(rectangle("red")).unwrap();
        let id = RegionId::from("red");

        let moved = Shape::Rectangle(BoundingBox::new(2, 2, 3, 3));
        set.update_shape(&id, moved).unwrap();
        assert_eq!(set.get(&id).unwrap().shape(), Some(moved));

        let wrong_kind = Shape::Line(LineSegment::new(0.0, 0.0, 1.0, 1.0));
        assert!(set.update_shape(&id, wrong_kind).is_err());
    }

    #[test]
    fn test_clear_marks_all_removed() {
        let set = RegionSet::new();
        let a = set.add(rectangle("a")).unwrap();
        let b = set.add(line("b")).unwrap();

        let mut cleared = set.clear();
        cleared.sort();
        assert_eq!(cleared, vec![RegionId::from("a"), RegionId::from("b")]);
        assert!(set.is_empty());
        assert!(a.is_removed() && b.is_removed());
    }

    #[test]
    fn test_only_lines_have_line_scans() {
        assert!(rectangle("r").line_scan().is_none());
        assert!(!rectangle("r").push_line_scan(vec![1.0]));
        assert!(line("l").line_scan().is_some());
    }
}
