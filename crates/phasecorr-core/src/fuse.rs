use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn};
use num_traits::AsPrimitive;
use rayon::ThreadPool;

use crate::error::{PhaseCorrError, Result};
use crate::parallel::{run_tasks_mut, split_view_mut};
use crate::portion::portion_count;

/// Paste `img2` over `img1` at `shift` for a quick visual check of a
/// registration.
///
/// The result covers the bounding box of both images; samples covered by
/// neither are zero. Returns the fused array and the coordinates of its first
/// sample in image1's frame.
pub fn overlay_fuse<T, S>(
    img1: &ArrayViewD<'_, T>,
    img2: &ArrayViewD<'_, S>,
    shift: &[i64],
    pool: &ThreadPool,
) -> Result<(ArrayD<f32>, Vec<i64>)>
where
    T: AsPrimitive<f32> + Sync,
    S: AsPrimitive<f32> + Sync,
{
    let n = img1.ndim();
    for got in [img2.ndim(), shift.len()] {
        if got != n {
            return Err(PhaseCorrError::DimensionMismatch { expected: n, got });
        }
    }

    let mut origin = vec![0i64; n];
    let mut shape = vec![0usize; n];
    for d in 0..n {
        let size1 = img1.shape()[d] as i64;
        let size2 = img2.shape()[d] as i64;
        let min = shift[d].min(0);
        let max = (size1 - 1).max(shift[d] + size2 - 1);
        origin[d] = min;
        shape[d] = (max - min + 1).max(0) as usize;
    }

    let mut fused = ArrayD::<f32>::zeros(IxDyn(&shape));
    let parts = portion_count(fused.len());
    let mut pieces = split_view_mut(fused.view_mut(), parts);

    let failed = run_tasks_mut(pool, &mut pieces, |piece| {
        let mut index = vec![0usize; n];
        let mut index1 = vec![0usize; n];
        let mut index2 = vec![0usize; n];
        let axis = piece.axis;
        let offset = piece.offset;
        for (local, value) in piece.view.indexed_iter_mut() {
            index.copy_from_slice(local.slice());
            if let Some(axis) = axis {
                index[axis] += offset;
            }

            let mut inside1 = true;
            let mut inside2 = true;
            for d in 0..n {
                let p = index[d] as i64 + origin[d];
                let q = p - shift[d];
                inside1 &= p >= 0 && p < img1.shape()[d] as i64;
                inside2 &= q >= 0 && q < img2.shape()[d] as i64;
                index1[d] = p.max(0) as usize;
                index2[d] = q.max(0) as usize;
            }

            *value = if inside2 {
                img2[&*index2].as_()
            } else if inside1 {
                img1[&*index1].as_()
            } else {
                0.0
            };
        }
    });
    drop(pieces);

    if !failed.is_empty() {
        tracing::warn!(failed = failed.len(), "Overlay fusion incomplete");
    }
    Ok((fused, origin))
}
