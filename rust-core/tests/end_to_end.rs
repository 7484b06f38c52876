use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rheed_core::series::{apply_cutoffs, snip};
use rheed_core::spectrum::{calc_fft, detect_peaks};

fn sampled(n: usize, rate: f64, mut f: impl FnMut(f64) -> f64) -> (Vec<f64>, Vec<f64>) {
    let t: Vec<f64> = (0..n).map(|i| i as f64 / rate).collect();
    let y = t.iter().map(|&ti| f(ti)).collect();
    (t, y)
}

#[test]
fn single_sinusoid_gives_one_peak_at_its_frequency() {
    let (t, y) = sampled(1000, 100.0, |t| (2.0 * PI * 5.0 * t).sin());

    let spectrum = calc_fft(&t, &y).unwrap();
    let peaks = detect_peaks(&spectrum.frequency, &spectrum.power, 0.0).unwrap();

    assert_eq!(peaks.len(), 1);
    let bin = spectrum.bin_width().unwrap();
    assert!(
        (peaks.frequencies[0] - 5.0).abs() <= bin,
        "peak at {} Hz, bin width {}",
        peaks.frequencies[0],
        bin
    );
}

#[test]
fn spectrum_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let (t, y) = sampled(777, 30.0, |t| (2.0 * PI * 0.7 * t).cos() + rng.gen_range(-0.3..0.3));

    let first = calc_fft(&t, &y).unwrap();
    let second = calc_fft(&t, &y).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.frequency.len(), first.power.len());
    assert_eq!(first.len(), 777 / 2 + 1);
}

#[test]
fn constant_series_has_no_spectrum() {
    let (t, y) = sampled(256, 10.0, |_| 42.0);
    assert!(calc_fft(&t, &y).is_none());
}

#[test]
fn oscillation_survives_noise() {
    let mut rng = StdRng::seed_from_u64(3);
    let (t, y) = sampled(2000, 50.0, |t| {
        50.0 + 5.0 * (2.0 * PI * 1.25 * t).sin() + rng.gen_range(-1.0..1.0)
    });

    let spectrum = calc_fft(&t, &y).unwrap();
    let peaks = detect_peaks(&spectrum.frequency, &spectrum.power, 0.1).unwrap();

    assert!(!peaks.is_empty());
    let bin = spectrum.bin_width().unwrap();
    assert!(peaks
        .frequencies
        .iter()
        .any(|&f| (f - 1.25).abs() <= bin));
}

#[test]
fn windowed_analysis_uses_trailing_aligned_samples() {
    // Timestamps run one sample longer than the values
    let (mut t, y) = sampled(1000, 100.0, |t| (2.0 * PI * 5.0 * t).sin());
    t.insert(0, -0.01);

    let (t_snipped, y_snipped) = snip(&t, &y);
    assert_eq!(t_snipped.len(), 1000);
    assert_eq!(t_snipped[0], 0.0);

    let (t_cut, y_cut) = apply_cutoffs(&t, &y, Some(0.0), Some(4.995));
    assert_eq!(t_cut.len(), 500);
    assert_eq!(y_cut[..], y_snipped[..500]);

    let spectrum = calc_fft(&t_cut, &y_cut).unwrap();
    assert_eq!(spectrum.len(), 251);
}
