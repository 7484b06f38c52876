//! Restrict an (x, y) series to an x range

use super::snip::snip;

/// Return the points whose x lies within `[minval, maxval]`
///
/// # Arguments
/// * `x`, `y` - Paired sequences (snipped to a common length first)
/// * `minval` - Lower bound; `None` uses `min(x)`
/// * `maxval` - Upper bound; `None` uses `max(x)`
///
/// `Some(0.0)` is an ordinary bound. Only `None` means "unset".
///
/// # Returns
/// Filtered x and y of equal length, in their original order
pub fn apply_cutoffs(
    x: &[f64],
    y: &[f64],
    minval: Option<f64>,
    maxval: Option<f64>,
) -> (Vec<f64>, Vec<f64>) {
    if x.is_empty() && y.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let (x, y) = snip(x, y);

    let lo = minval.unwrap_or_else(|| x.iter().copied().fold(f64::INFINITY, f64::min));
    let hi = maxval.unwrap_or_else(|| x.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    x.iter()
        .zip(y.iter())
        .filter(|&(&xi, _)| xi >= lo && xi <= hi)
        .map(|(&xi, &yi)| (xi, yi))
        .unzip()
}
