use crate::consts::{SUBPIXEL_CURVATURE_EPSILON, SUBPIXEL_MAX_OFFSET};
use crate::periodic::PeriodicView;

/// Refine a PCM maximum by fitting a parabola through it and its two
/// periodic neighbours along each axis independently.
///
/// Returns the refined position in PCM coordinates. Axes with a flat
/// neighbourhood keep their integer coordinate; corrections are clamped to
/// half a sample.
pub fn refine_peak_quadratic(pcm: &PeriodicView<'_>, position: &[i64]) -> Vec<f64> {
    let n = pcm.ndim();
    let mut index = vec![0usize; n];
    let center = pcm.get(position, &mut index);

    (0..n)
        .map(|d| {
            let prev = pcm.neighbor(position, d, -1, &mut index);
            let next = pcm.neighbor(position, d, 1, &mut index);
            position[d] as f64 + parabola_vertex(prev, center, next)
        })
        .collect()
}

/// Vertex of the parabola through `(-1, prev)`, `(0, center)`, `(1, next)`.
fn parabola_vertex(prev: f64, center: f64, next: f64) -> f64 {
    let curvature = prev - 2.0 * center + next;
    if curvature.abs() <= SUBPIXEL_CURVATURE_EPSILON || !curvature.is_finite() {
        return 0.0;
    }
    let delta = (prev - next) / (2.0 * curvature);
    if delta.is_finite() {
        delta.clamp(-SUBPIXEL_MAX_OFFSET, SUBPIXEL_MAX_OFFSET)
    } else {
        0.0
    }
}
