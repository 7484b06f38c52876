//! Append-only per-region time series
//!
//! The analysis thread is the only writer. Readers on other threads take
//! snapshots, which are always snipped to equal length.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use super::snip::snip;

/// Value produced by one region for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    /// Mean intensity of a rectangle or ellipse
    Scalar(f64),

    /// Intensity profile along a line
    Profile(Vec<f64>),
}

impl SampleValue {
    /// Scalar view of the sample (profiles reduce to their mean)
    pub fn scalar(&self) -> Option<f64> {
        match self {
            SampleValue::Scalar(v) => Some(*v),
            SampleValue::Profile(p) if !p.is_empty() => {
                Some(p.iter().sum::<f64>() / p.len() as f64)
            }
            SampleValue::Profile(_) => None,
        }
    }

    pub fn as_profile(&self) -> Option<&[f64]> {
        match self {
            SampleValue::Profile(p) => Some(p),
            SampleValue::Scalar(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: SampleValue,
}

impl Sample {
    pub fn scalar(timestamp: f64, value: f64) -> Self {
        Self {
            timestamp,
            value: SampleValue::Scalar(value),
        }
    }

    pub fn profile(timestamp: f64, profile: Vec<f64>) -> Self {
        Self {
            timestamp,
            value: SampleValue::Profile(profile),
        }
    }
}

/// Paired scalar time series copied out of a [`Series`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSnapshot {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl SeriesSnapshot {
    /// Build a snapshot from independently read sequences
    pub fn from_pairs(times: &[f64], values: &[f64]) -> Self {
        let (times, values) = snip(times, values);
        Self {
            times: times.to_vec(),
            values: values.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp of the most recent sample
    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }
}

/// Time-ordered samples for one region
#[derive(Debug, Clone, Default)]
pub struct Series {
    times: Vec<f64>,
    values: Vec<SampleValue>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    ///
    /// # Returns
    /// `false` if the timestamp is not finite or goes backwards in time
    pub fn push(&mut self, sample: Sample) -> bool {
        if !sample.timestamp.is_finite() {
            warn!("Rejecting sample with non-finite timestamp");
            return false;
        }
        if let Some(&last) = self.times.last() {
            if sample.timestamp < last {
                warn!(
                    "Rejecting out-of-order sample at t={} (last t={})",
                    sample.timestamp, last
                );
                return false;
            }
        }

        self.times.push(sample.timestamp);
        self.values.push(sample.value);
        true
    }

    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[SampleValue] {
        &self.values
    }

    /// Most recent sample
    pub fn last(&self) -> Option<Sample> {
        let (times, values) = snip(&self.times, &self.values);
        match (times.last(), values.last()) {
            (Some(&timestamp), Some(value)) => Some(Sample {
                timestamp,
                value: value.clone(),
            }),
            _ => None,
        }
    }

    /// Copy out the scalar view of the series
    ///
    /// Samples without a scalar view (empty profiles) are dropped together
    /// with their timestamps.
    pub fn scalar_snapshot(&self) -> SeriesSnapshot {
        let (times, values) = snip(&self.times, &self.values);
        let (times, values): (Vec<f64>, Vec<f64>) = times
            .iter()
            .zip(values.iter())
            .filter_map(|(&t, v)| v.scalar().map(|s| (t, s)))
            .unzip();
        SeriesSnapshot { times, values }
    }

    /// Most recent line profile, if this series holds profiles
    pub fn latest_profile(&self) -> Option<Vec<f64>> {
        self.values
            .iter()
            .rev()
            .find_map(|v| v.as_profile().map(<[f64]>::to_vec))
    }

    pub fn clear(&mut self) {
        self.times.clear();
        self.values.clear();
    }
}

#[derive(Debug, Default)]
struct SeriesState {
    series: Series,
    closed: bool,
}

/// Thread-shared series owned by one region
///
/// Closing a series discards its data and refuses every later append, so an
/// in-flight aggregation can never bring a removed region's data back.
#[derive(Debug, Clone, Default)]
pub struct SharedSeries {
    inner: Arc<Mutex<SeriesState>>,
}

impl SharedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    ///
    /// # Returns
    /// `true` if the sample was stored
    pub fn append(&self, sample: Sample) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        if state.closed {
            debug!("Dropping sample for closed series");
            return false;
        }
        state.series.push(sample)
    }

    /// Close the series and release its data
    pub fn close(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.closed = true;
            state.series.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().map(|s| s.closed).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.series.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar snapshot, or `None` once the series is closed
    pub fn snapshot(&self) -> Option<SeriesSnapshot> {
        let state = self.inner.lock().ok()?;
        if state.closed {
            return None;
        }
        Some(state.series.scalar_snapshot())
    }

    pub fn last(&self) -> Option<Sample> {
        let state = self.inner.lock().ok()?;
        state.series.last()
    }

    pub fn latest_profile(&self) -> Option<Vec<f64>> {
        let state = self.inner.lock().ok()?;
        state.series.latest_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_append_and_snapshot() {
        let mut series = Series::new();
        assert!(series.push(Sample::scalar(0.0, 1.0)));
        assert!(series.push(Sample::scalar(0.1, 2.0)));
        assert!(series.push(Sample::scalar(0.1, 3.0))); // equal timestamps are allowed

        let snap = series.scalar_snapshot();
        assert_eq!(snap.times, vec![0.0, 0.1, 0.1]);
        assert_eq!(snap.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(snap.last_time(), Some(0.1));
    }

    #[test]
    fn test_series_rejects_time_going_backwards() {
        let mut series = Series::new();
        assert!(series.push(Sample::scalar(1.0, 1.0)));
        assert!(!series.push(Sample::scalar(0.5, 2.0)));
        assert!(!series.push(Sample::scalar(f64::NAN, 2.0)));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_profile_scalar_view_is_mean() {
        let mut series = Series::new();
        series.push(Sample::profile(0.0, vec![1.0, 2.0, 3.0]));
        series.push(Sample::profile(1.0, vec![4.0, 4.0]));

        let snap = series.scalar_snapshot();
        assert_eq!(snap.values, vec![2.0, 4.0]);
        assert_eq!(series.latest_profile(), Some(vec![4.0, 4.0]));
    }

    #[test]
    fn test_closed_series_refuses_appends() {
        let shared = SharedSeries::new();
        assert!(shared.append(Sample::scalar(0.0, 1.0)));
        assert_eq!(shared.len(), 1);

        shared.close();

        assert!(shared.is_closed());
        assert!(shared.is_empty());
        assert!(shared.snapshot().is_none());
        assert!(!shared.append(Sample::scalar(1.0, 1.0)));
        assert!(shared.is_empty());
    }

    #[test]
    fn test_shared_series_clones_share_storage() {
        let writer = SharedSeries::new();
        let reader = writer.clone();

        writer.append(Sample::scalar(0.0, 5.0));

        let snap = reader.snapshot().unwrap();
        assert_eq!(snap.values, vec![5.0]);
        assert_eq!(reader.last(), Some(Sample::scalar(0.0, 5.0)));
    }

    #[test]
    fn test_snapshot_from_drifted_pairs() {
        let snap = SeriesSnapshot::from_pairs(&[0.0, 1.0, 2.0], &[7.0, 8.0]);
        assert_eq!(snap.times, vec![1.0, 2.0]);
        assert_eq!(snap.values, vec![7.0, 8.0]);
    }
}
