use ndarray::ArrayViewD;
use num_traits::AsPrimitive;

/// N-linear interpolation of `data` at a continuous `position`.
///
/// Coordinates outside the array are clamped to the border sample. `index`
/// is scratch space of length `data.ndim()`.
pub fn nlinear_sample<T>(data: &ArrayViewD<'_, T>, position: &[f64], index: &mut [usize]) -> f64
where
    T: AsPrimitive<f64>,
{
    let n = data.ndim();
    let shape = data.shape();
    let mut sum = 0.0;

    for corner in 0..1usize << n {
        let mut weight = 1.0;
        for d in 0..n {
            let base = position[d].floor();
            let frac = position[d] - base;
            let upper = (corner >> d) & 1 == 1;
            let coord = base as i64 + i64::from(upper);
            index[d] = coord.clamp(0, shape[d] as i64 - 1) as usize;
            weight *= if upper { frac } else { 1.0 - frac };
        }
        if weight != 0.0 {
            sum += weight * data[&*index].as_();
        }
    }

    sum
}
