mod common;

use approx::assert_abs_diff_eq;

use phasecorr_core::interval::Interval;
use phasecorr_core::maxima::{find_peaks, find_peaks_mt, merge_maxima, pcm_maxima, FilterContext};
use phasecorr_core::periodic::PeriodicView;
use phasecorr_core::{PhaseCorrelationPeak, ShiftGeometry, ShiftRangeFilter};

use common::{noise_pcm, pool, spike_pcm};

fn positions(peaks: &[PhaseCorrelationPeak]) -> Vec<Vec<i64>> {
    peaks.iter().map(|p| p.pcm_position.clone()).collect()
}

// ---------------------------------------------------------------------------
// Serial search
// ---------------------------------------------------------------------------

#[test]
fn test_finds_strongest_spikes_in_order() {
    let pcm = spike_pcm(&[8, 8], &[(vec![1, 1], 5.0), (vec![4, 6], 3.0), (vec![6, 2], 4.0)]);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());

    let peaks = find_peaks(&view, &region, 3, None);
    assert_eq!(positions(&peaks), vec![vec![1, 1], vec![6, 2], vec![4, 6]]);
    assert_eq!(peaks[0].phase_correlation, 5.0);
    assert_eq!(peaks[2].phase_correlation, 3.0);
    assert!(peaks.iter().all(|p| p.shift.is_none()));
}

#[test]
fn test_wrapped_neighbour_disqualifies_edge_sample() {
    let pcm = spike_pcm(&[8, 8], &[(vec![0, 0], 5.0), (vec![7, 0], 6.0)]);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());

    let peaks = find_peaks(&view, &region, 1, None);
    assert_eq!(positions(&peaks), vec![vec![7, 0]]);
}

#[test]
fn test_every_maximum_dominates_its_neighbours() {
    let pcm = noise_pcm(32, 24, 3);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());
    let mut index = vec![0usize; 2];

    for peak in find_peaks(&view, &region, 20, None) {
        let value = peak.phase_correlation;
        for axis in 0..2 {
            for step in [-1, 1] {
                let neighbour = view.neighbor(&peak.pcm_position, axis, step, &mut index);
                assert!(value >= neighbour, "{:?} has a larger neighbour", peak.pcm_position);
            }
        }
    }
}

#[test]
fn test_zero_requested_maxima() {
    let pcm = noise_pcm(16, 16, 1);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());
    assert!(find_peaks(&view, &region, 0, None).is_empty());
    assert!(find_peaks_mt(&view, &region, 0, 8, &pool(2), None).peaks.is_empty());
}

#[test]
fn test_single_row_pcm() {
    let pcm = spike_pcm(&[1, 40], &[(vec![0, 17], 2.0)]);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());

    let peaks = find_peaks(&view, &region, 1, None);
    assert_eq!(positions(&peaks), vec![vec![0, 17]]);
}

// ---------------------------------------------------------------------------
// Parallel search
// ---------------------------------------------------------------------------

#[test]
fn test_task_count_does_not_change_result() {
    let pcm = noise_pcm(64, 48, 42);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());

    let single = find_peaks_mt(&view, &region, 10, 1, &pool(1), None);
    let many = find_peaks_mt(&view, &region, 10, 16, &pool(4), None);
    let serial = find_peaks(&view, &region, 10, None);

    assert_eq!(single.failed_tasks, 0);
    assert_eq!(many.failed_tasks, 0);
    assert_eq!(single.peaks, serial);
    assert_eq!(many.peaks, serial);
}

#[test]
fn test_more_tasks_than_rows() {
    let pcm = spike_pcm(&[3, 2], &[(vec![2, 1], 1.0)]);
    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());

    let maxima = find_peaks_mt(&view, &region, 1, 64, &pool(4), None);
    assert_eq!(positions(&maxima.peaks), vec![vec![2, 1]]);
}

#[test]
fn test_merge_keeps_global_top() {
    let partial = vec![
        vec![
            PhaseCorrelationPeak::new(vec![0, 1], 0.9),
            PhaseCorrelationPeak::new(vec![3, 3], 0.2),
        ],
        vec![
            PhaseCorrelationPeak::new(vec![5, 0], 0.5),
            PhaseCorrelationPeak::new(vec![4, 4], 0.9),
        ],
    ];
    let merged = merge_maxima(partial, 3);
    assert_eq!(positions(&merged), vec![vec![0, 1], vec![4, 4], vec![5, 0]]);
}

// ---------------------------------------------------------------------------
// Filtering and subpixel refinement
// ---------------------------------------------------------------------------

#[test]
fn test_filter_skips_positions_without_accepted_shift() {
    let pcm = spike_pcm(&[20, 20], &[(vec![10, 10], 3.0), (vec![2, 3], 1.0)]);
    let geometry = ShiftGeometry::new(&[20, 20], &[10, 10], &[10, 10]).unwrap();
    let small = ShiftRangeFilter::symmetric(&[4.0, 4.0]);
    let context = FilterContext {
        filter: &small,
        geometry: &geometry,
    };

    let view = PeriodicView::new(pcm.view());
    let region = Interval::from_shape(view.shape());
    let peaks = find_peaks(&view, &region, 1, Some(context));
    // (10, 10) only expands to shifts of magnitude 10
    assert_eq!(positions(&peaks), vec![vec![2, 3]]);
}

#[test]
fn test_subpixel_refinement_moves_towards_larger_neighbour() {
    let pcm = spike_pcm(&[20, 20], &[(vec![10, 10], 1.0), (vec![10, 11], 0.5)]);
    let maxima = pcm_maxima(pcm.view(), &pool(2), 1, true, None);

    let peak = &maxima.peaks[0];
    assert_eq!(peak.pcm_position, vec![10, 10]);
    let refined = peak.subpixel_pcm_position.as_ref().unwrap();
    assert_abs_diff_eq!(refined[0], 10.0, epsilon = 1e-12);
    assert_abs_diff_eq!(refined[1], 10.0 + 1.0 / 6.0, epsilon = 1e-12);
}

#[test]
fn test_subpixel_disabled_leaves_position_unset() {
    let pcm = spike_pcm(&[12, 12], &[(vec![3, 4], 1.0)]);
    let maxima = pcm_maxima(pcm.view(), &pool(1), 2, false, None);
    assert!(maxima.peaks.iter().all(|p| p.subpixel_pcm_position.is_none()));
}
