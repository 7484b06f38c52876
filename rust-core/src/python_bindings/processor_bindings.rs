//! Python bindings for the RHEED processor

use numpy::{PyArray1, PyArray2, PyReadonlyArray2};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::AnalysisConfig;
use crate::frame::Frame;
use crate::pipeline::RheedProcessor;
use crate::regions::{BoundingBox, ChannelSelection, LineSegment, RegionId, Shape};

fn channel(index: Option<usize>) -> ChannelSelection {
    index.map_or(ChannelSelection::Mean, ChannelSelection::Index)
}

/// RHEED processor exposed to Python
///
/// Frames are pushed from Python and analyzed on the calling thread.
#[pyclass(name = "RheedProcessor", unsendable)]
pub struct PyRheedProcessor {
    processor: RheedProcessor,
}

#[pymethods]
impl PyRheedProcessor {
    /// Create a new processor
    ///
    /// Args:
    ///     config_json: Optional JSON analysis configuration
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => AnalysisConfig::from_json_str(json)?,
            None => AnalysisConfig::default(),
        };
        Ok(Self {
            processor: RheedProcessor::new(config),
        })
    }

    /// Add a rectangular region with top-left corner (x, y)
    #[pyo3(signature = (id, x, y, width, height, channel_index=None))]
    fn add_rectangle(
        &self,
        id: &str,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        channel_index: Option<usize>,
    ) -> PyResult<()> {
        let shape = Shape::Rectangle(BoundingBox::new(x, y, width, height));
        Ok(self.processor.add_region(id, shape, channel(channel_index))?)
    }

    /// Add an elliptical region inscribed in the given box
    #[pyo3(signature = (id, x, y, width, height, channel_index=None))]
    fn add_ellipse(
        &self,
        id: &str,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        channel_index: Option<usize>,
    ) -> PyResult<()> {
        let shape = Shape::Ellipse(BoundingBox::new(x, y, width, height));
        Ok(self.processor.add_region(id, shape, channel(channel_index))?)
    }

    /// Add a line region from (x0, y0) to (x1, y1)
    #[pyo3(signature = (id, x0, y0, x1, y1, channel_index=None))]
    fn add_line(
        &self,
        id: &str,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        channel_index: Option<usize>,
    ) -> PyResult<()> {
        let shape = Shape::Line(LineSegment::new(x0, y0, x1, y1));
        Ok(self.processor.add_region(id, shape, channel(channel_index))?)
    }

    /// Remove a region and discard its data
    fn remove_region(&self, id: &str) -> PyResult<()> {
        Ok(self.processor.remove_region(&RegionId::from(id))?)
    }

    /// IDs of the active regions
    fn region_ids(&self) -> Vec<String> {
        self.processor
            .regions()
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    /// Analyze one grayscale frame
    ///
    /// Args:
    ///     timestamp: Acquisition time in seconds
    ///     frame: 2-D intensity array (rows, cols)
    ///
    /// Returns:
    ///     Number of regions that produced a sample
    fn push_frame(&self, timestamp: f64, frame: PyReadonlyArray2<f64>) -> PyResult<usize> {
        let pixels = frame.as_array().mapv(|v| v as f32);
        let frame = Frame::from_gray(timestamp, pixels)?;
        Ok(self.processor.process_frame(&frame).len())
    }

    /// Scalar series of a region
    ///
    /// Returns:
    ///     Tuple of (times, values) arrays, or None
    fn series<'py>(
        &self,
        py: Python<'py>,
        id: &str,
    ) -> Option<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
        self.processor.series(&RegionId::from(id)).map(|s| {
            (
                PyArray1::from_vec(py, s.times),
                PyArray1::from_vec(py, s.values),
            )
        })
    }

    /// Spectrum of a region's series, computed now
    ///
    /// Returns:
    ///     Dictionary with keys 'frequency', 'power' and 'peaks' (None if
    ///     peak detection could not run), or None
    fn spectrum<'py>(&self, py: Python<'py>, id: &str) -> PyResult<Option<PyObject>> {
        let Some(analysis) = self.processor.analyze_region(&RegionId::from(id))? else {
            return Ok(None);
        };

        let dict = PyDict::new(py);
        dict.set_item(
            "frequency",
            PyArray1::from_slice(py, &analysis.spectrum.frequency),
        )?;
        dict.set_item("power", PyArray1::from_slice(py, &analysis.spectrum.power))?;
        dict.set_item(
            "peaks",
            analysis
                .peaks
                .as_ref()
                .map(|p| PyArray1::from_slice(py, &p.frequencies)),
        )?;
        Ok(Some(dict.into()))
    }

    /// Line-scan image of a line region, shaped (position, time)
    fn line_scan<'py>(&self, py: Python<'py>, id: &str) -> Option<&'py PyArray2<f64>> {
        self.processor
            .line_scan(&RegionId::from(id))
            .map(|image| PyArray2::from_owned_array(py, image))
    }

    /// Most recent profile of a line region
    fn latest_profile<'py>(&self, py: Python<'py>, id: &str) -> Option<&'py PyArray1<f64>> {
        self.processor
            .latest_profile(&RegionId::from(id))
            .map(|profile| PyArray1::from_vec(py, profile))
    }

    /// Number of frames analyzed so far
    fn frames_processed(&self) -> u64 {
        self.processor.stats().frames_processed
    }
}
