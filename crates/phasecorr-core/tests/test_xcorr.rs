mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, ArrayD};

use phasecorr_core::interpolate::nlinear_sample;
use phasecorr_core::xcorr::{
    calculate_cross_corr, calculate_cross_corr_default, calculate_cross_corr_parallel, correlation,
    XcorrOptions,
};
use phasecorr_core::{Interval, MinOverlap, PhaseCorrError, PhaseCorrelationPeak, ShiftRangeFilter};

use common::{crop, noise, pool};

fn candidate(shift: &[i64]) -> PhaseCorrelationPeak {
    let mut peak = PhaseCorrelationPeak::new(vec![0; shift.len()], 1.0);
    peak.shift = Some(shift.to_vec());
    peak
}

fn ramp(h: usize, w: usize) -> ArrayD<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| r as f32 + 2.0 * c as f32).into_dyn()
}

// ---------------------------------------------------------------------------
// correlation
// ---------------------------------------------------------------------------

#[test]
fn test_identical_images_correlate_perfectly() {
    let img = noise(30, 20, 5).into_dyn();
    let region = Interval::from_shape(img.shape());
    let result = correlation(&img.view(), &img.view(), &region, &region, &pool(2)).unwrap();
    assert_abs_diff_eq!(result.value, 1.0, epsilon = 1e-9);
    assert_eq!(result.n_pixel, 600);
    assert_eq!(result.failed_tasks, 0);
}

#[test]
fn test_inverted_image_anticorrelates() {
    let img = noise(16, 16, 9).into_dyn();
    let inverted = img.mapv(|v| 1.0 - v);
    let region = Interval::from_shape(img.shape());
    let result = correlation(&img.view(), &inverted.view(), &region, &region, &pool(1)).unwrap();
    assert_abs_diff_eq!(result.value, -1.0, epsilon = 1e-9);
}

#[test]
fn test_uniform_region_scores_zero() {
    let flat = ArrayD::<f32>::from_elem(ndarray::IxDyn(&[10, 10]), 0.5);
    let region = Interval::from_shape(flat.shape());
    let result = correlation(&flat.view(), &flat.view(), &region, &region, &pool(1)).unwrap();
    assert_eq!(result.value, 0.0);
    assert_eq!(result.n_pixel, 100);
}

#[test]
fn test_large_overlap_matches_across_pools() {
    let img = noise(160, 150, 21).into_dyn();
    let other = noise(160, 150, 22).into_dyn();
    let region = Interval::from_shape(img.shape());
    let serial = correlation(&img.view(), &other.view(), &region, &region, &pool(1)).unwrap();
    let parallel = correlation(&img.view(), &other.view(), &region, &region, &pool(4)).unwrap();
    assert_abs_diff_eq!(serial.value, parallel.value, epsilon = 1e-9);
    assert_eq!(serial.n_pixel, 24_000);
}

#[test]
fn test_region_extent_mismatch() {
    let img = noise(10, 10, 1).into_dyn();
    let r1 = Interval::new(vec![0, 0], vec![4, 4]);
    let r2 = Interval::new(vec![0, 0], vec![4, 5]);
    let err = correlation(&img.view(), &img.view(), &r1, &r2, &pool(1)).unwrap_err();
    assert!(matches!(err, PhaseCorrError::ShapeMismatch { .. }));
}

// ---------------------------------------------------------------------------
// calculate_cross_corr
// ---------------------------------------------------------------------------

#[test]
fn test_true_shift_of_cropped_tiles() {
    let scene = noise(60, 60, 4);
    let img1 = crop(&scene, 0, 0, 40, 40);
    let img2 = crop(&scene, 7, 12, 40, 40);

    let mut peak = candidate(&[7, 12]);
    let lost = calculate_cross_corr(
        &mut peak,
        &img1.view(),
        &img2.view(),
        &XcorrOptions::default(),
        &pool(2),
    );
    assert_eq!(lost, 0);
    assert_abs_diff_eq!(peak.cross_correlation, 1.0, epsilon = 1e-9);
    assert_eq!(peak.n_pixel, 33 * 28);
}

#[test]
fn test_no_overlap_rejects() {
    let img = noise(10, 10, 2).into_dyn();
    let mut peak = candidate(&[10, 0]);
    calculate_cross_corr(&mut peak, &img.view(), &img.view(), &XcorrOptions::default(), &pool(1));
    assert_eq!(peak.cross_correlation, f64::NEG_INFINITY);
    assert_eq!(peak.n_pixel, 0);
    assert!(peak.is_rejected());
    assert!(!peak.is_valid());
}

#[test]
fn test_insufficient_overlap_rejects() {
    let img = noise(10, 10, 2).into_dyn();
    let options = XcorrOptions {
        min_overlap: MinOverlap::Total(50),
        interpolate_subpixel: false,
    };

    let mut small = candidate(&[6, 0]);
    calculate_cross_corr(&mut small, &img.view(), &img.view(), &options, &pool(1));
    assert!(small.is_rejected());

    let mut large = candidate(&[5, 0]);
    calculate_cross_corr(&mut large, &img.view(), &img.view(), &options, &pool(1));
    assert!(large.is_valid());
    assert_eq!(large.n_pixel, 50);
}

#[test]
fn test_unexpanded_peak_rejects() {
    let img = noise(8, 8, 2).into_dyn();
    let mut peak = PhaseCorrelationPeak::new(vec![1, 1], 1.0);
    calculate_cross_corr(&mut peak, &img.view(), &img.view(), &XcorrOptions::default(), &pool(1));
    assert!(peak.is_rejected());
}

/// `img2` sits 3.5 columns into `img1`: each sample averages two neighbours.
fn half_sample_pair() -> (ArrayD<f32>, ArrayD<f32>) {
    let img1 = noise(40, 44, 13);
    let img2 = Array2::from_shape_fn((40, 40), |(r, c)| 0.5 * (img1[[r, c + 3]] + img1[[r, c + 4]]));
    (img1.into_dyn(), img2.into_dyn())
}

fn interpolated_score(img1: &ArrayD<f32>, img2: &ArrayD<f32>, subpixel: f64) -> PhaseCorrelationPeak {
    let mut peak = candidate(&[0, 3]);
    peak.subpixel_shift = Some(vec![0.0, subpixel]);
    let options = XcorrOptions {
        min_overlap: MinOverlap::Any,
        interpolate_subpixel: true,
    };
    calculate_cross_corr(&mut peak, &img1.view(), &img2.view(), &options, &pool(2));
    peak
}

#[test]
fn test_interpolated_subpixel_shift_direction() {
    let (img1, img2) = half_sample_pair();
    let right = interpolated_score(&img1, &img2, 3.5);
    let wrong = interpolated_score(&img1, &img2, 2.5);

    assert_eq!(right.n_pixel, 40 * 40);
    assert_eq!(wrong.n_pixel, 40 * 40);
    assert!(right.cross_correlation > 0.7, "r={}", right.cross_correlation);
    assert!(wrong.cross_correlation < 0.55, "r={}", wrong.cross_correlation);
    assert!(right.cross_correlation > wrong.cross_correlation + 0.2);
}

#[test]
fn test_integer_scoring_ignores_subpixel_when_not_interpolating() {
    let (img1, img2) = half_sample_pair();
    let mut peak = candidate(&[0, 3]);
    peak.subpixel_shift = Some(vec![0.0, 2.5]);
    calculate_cross_corr(&mut peak, &img1.view(), &img2.view(), &XcorrOptions::default(), &pool(1));
    let reference = interpolated_score(&img1, &img2, 3.0);
    assert_abs_diff_eq!(peak.cross_correlation, reference.cross_correlation, epsilon = 1e-9);
}

#[test]
fn test_nan_sample_rejects_overlapping_shifts() {
    let mut img1 = noise(10, 10, 2).into_dyn();
    img1[[0, 0]] = f32::NAN;
    let img2 = noise(10, 10, 3).into_dyn();

    let mut covering = candidate(&[0, 0]);
    calculate_cross_corr(&mut covering, &img1.view(), &img2.view(), &XcorrOptions::default(), &pool(1));
    assert!(covering.is_rejected());
    assert_eq!(covering.n_pixel, 0);

    let mut clear = candidate(&[5, 5]);
    calculate_cross_corr(&mut clear, &img1.view(), &img2.view(), &XcorrOptions::default(), &pool(1));
    assert!(clear.is_valid());
    assert_eq!(clear.n_pixel, 25);
}

#[test]
fn test_nlinear_sample() {
    let img = ramp(4, 4);
    let view = img.view();
    let mut index = vec![0usize; 2];
    assert_abs_diff_eq!(nlinear_sample(&view, &[1.0, 1.0], &mut index), 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(nlinear_sample(&view, &[1.5, 2.25], &mut index), 6.0, epsilon = 1e-12);
    // clamped at the border
    assert_abs_diff_eq!(nlinear_sample(&view, &[-2.0, 0.0], &mut index), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(nlinear_sample(&view, &[3.0, 7.5], &mut index), 9.0, epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// calculate_cross_corr_parallel
// ---------------------------------------------------------------------------

#[test]
fn test_parallel_scoring_matches_serial() {
    let scene = noise(60, 60, 8);
    let img1 = crop(&scene, 0, 0, 40, 40);
    let img2 = crop(&scene, 3, 2, 40, 40);
    let shifts = [[3i64, 2], [0, 0], [-5, 7], [39, 39], [40, 0], [-20, -20]];

    let mut parallel: Vec<_> = shifts.iter().map(|s| candidate(s)).collect();
    let failed = calculate_cross_corr_parallel(
        &mut parallel,
        &img1.view(),
        &img2.view(),
        &XcorrOptions::default(),
        None,
        &pool(4),
    )
    .unwrap();
    assert_eq!(failed, 0);

    for (shift, scored) in shifts.iter().zip(&parallel) {
        let mut serial = candidate(shift);
        calculate_cross_corr(&mut serial, &img1.view(), &img2.view(), &XcorrOptions::default(), &pool(1));
        assert_eq!(serial.n_pixel, scored.n_pixel, "shift {shift:?}");
        if serial.is_valid() {
            assert_abs_diff_eq!(serial.cross_correlation, scored.cross_correlation, epsilon = 1e-12);
        } else {
            assert!(scored.is_rejected() || scored.cross_correlation == 0.0);
        }
    }
    assert_abs_diff_eq!(parallel[0].cross_correlation, 1.0, epsilon = 1e-9);
    assert!(parallel[4].is_rejected());
}

#[test]
fn test_parallel_scoring_applies_filter() {
    let img = noise(20, 20, 3).into_dyn();
    let mut peaks = vec![candidate(&[1, 1]), candidate(&[8, -8])];
    let filter = ShiftRangeFilter::symmetric(&[2.0, 2.0]);
    calculate_cross_corr_parallel(
        &mut peaks,
        &img.view(),
        &img.view(),
        &XcorrOptions::default(),
        Some(&filter),
        &pool(2),
    )
    .unwrap();
    assert!(peaks[0].is_valid());
    assert!(peaks[1].is_rejected());
}

#[test]
fn test_panicking_filter_rejects_its_candidate() {
    let img = noise(20, 20, 3).into_dyn();
    let mut peaks = vec![candidate(&[1, 1]), candidate(&[2, 2]), candidate(&[0, 3])];
    let filter = |shift: &[f64]| {
        if shift == [2.0, 2.0] {
            panic!("filter failed on {shift:?}");
        }
        true
    };
    let failed = calculate_cross_corr_parallel(
        &mut peaks,
        &img.view(),
        &img.view(),
        &XcorrOptions::default(),
        Some(&filter),
        &pool(2),
    )
    .unwrap();
    assert!(failed >= 1);
    assert!(peaks[1].is_rejected());
    assert_eq!(peaks[1].n_pixel, 0);
    assert!(peaks[0].is_valid());
    assert!(peaks[2].is_valid());
}

#[test]
fn test_parallel_scoring_dimensionality_mismatch() {
    let img2d = noise(8, 8, 1).into_dyn();
    let img3d = ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 2, 2]));
    let mut peaks = vec![candidate(&[0, 0])];
    let err = calculate_cross_corr_parallel(
        &mut peaks,
        &img2d.view(),
        &img3d.view(),
        &XcorrOptions::default(),
        None,
        &pool(1),
    )
    .unwrap_err();
    assert!(matches!(err, PhaseCorrError::DimensionMismatch { .. }));
}

#[test]
fn test_default_entry_point() {
    let img = noise(16, 16, 6).into_dyn();
    let mut peaks = vec![candidate(&[0, 0]), candidate(&[2, 3])];
    let failed = calculate_cross_corr_default(&mut peaks, &img.view(), &img.view(), MinOverlap::Any).unwrap();
    assert_eq!(failed, 0);
    assert_abs_diff_eq!(peaks[0].cross_correlation, 1.0, epsilon = 1e-9);
    assert_eq!(peaks[1].n_pixel, 14 * 13);
}
