//! Spectral peak detection with a noise-adaptive height threshold
//!
//! Local maxima (flat tops resolve to their midpoint) are filtered by a
//! height of `max(median + sigma·std, floor)` and then thinned so that no two
//! peaks are closer than `min_distance` bins, keeping the higher one.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::series::apply_cutoffs;

/// Peak detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Ignore frequencies below this value (Hz)
    pub min_freq: f64,

    /// Minimum spacing between peaks, in bins (not Hz)
    pub min_distance: usize,

    /// Standard deviations above the median a peak must reach
    pub sigma: f64,

    /// Absolute height floor, so flat spectra never report peaks
    pub height_floor: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            min_freq: 0.0,
            min_distance: 50,
            sigma: 3.0,
            height_floor: 1.5,
        }
    }
}

/// Frequencies of detected peaks, in ascending bin order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    pub frequencies: Vec<f64>,
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Detect peaks in a spectrum
///
/// # Arguments
/// * `x` - Frequency axis
/// * `y` - Spectral power
/// * `config` - Detection parameters
///
/// # Returns
/// `None` if detection cannot run (nothing above `min_freq`, non-finite
/// values, or zero variance). `Some` with an empty set if it ran and found
/// nothing.
pub fn find_peaks(x: &[f64], y: &[f64], config: &PeakConfig) -> Option<PeakSet> {
    let (x, y) = apply_cutoffs(x, y, Some(config.min_freq), None);
    if y.is_empty() || y.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let (mean, std) = mean_std(&y);
    if std == 0.0 || !mean.is_finite() {
        debug!("Spectrum has zero variance; skipping peak detection");
        return None;
    }
    let height = (median(&y) + config.sigma * std).max(config.height_floor);

    let maxima: Vec<usize> = local_maxima(&y)
        .into_iter()
        .filter(|&i| y[i] >= height)
        .collect();
    let kept = select_by_distance(&maxima, &y, config.min_distance.max(1));

    Some(PeakSet {
        frequencies: kept.into_iter().map(|i| x[i]).collect(),
    })
}

/// Detect peaks using the default configuration with a custom `min_freq`
pub fn detect_peaks(x: &[f64], y: &[f64], min_freq: f64) -> Option<PeakSet> {
    let config = PeakConfig {
        min_freq,
        ..PeakConfig::default()
    };
    find_peaks(x, y, &config)
}

/// Indices of local maxima; a plateau reports its (rounded-down) midpoint
fn local_maxima(y: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if y.len() < 3 {
        return peaks;
    }

    let i_max = y.len() - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && y[i_ahead] == y[i] {
                i_ahead += 1;
            }
            if y[i_ahead] < y[i] {
                let left = i;
                let right = i_ahead - 1;
                peaks.push((left + right) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop peaks closer than `distance` bins to a higher peak
///
/// Peaks are visited from highest to lowest; ties keep the later index first.
fn select_by_distance(peaks: &[usize], y: &[f64], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    let mut by_priority: Vec<usize> = (0..peaks.len()).collect();
    by_priority.sort_by(|&a, &b| y[peaks[a]].total_cmp(&y[peaks[b]]));

    for &j in by_priority.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

fn mean_std(y: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let var = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn median(y: &[f64]) -> f64 {
    let mut sorted = y.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
