use crate::interval::Interval;

/// Overlapping region of two images when image2 is displaced by `shift`
/// relative to image1.
///
/// Returns one interval per image, each relative to that image's origin, or
/// `None` when the images do not overlap along some axis (which happens for
/// shift hypotheses produced by padding and wraparound).
pub fn overlap_intervals(
    dims1: &[usize],
    dims2: &[usize],
    shift: &[i64],
) -> Option<(Interval, Interval)> {
    let n = dims1.len();
    let mut min1 = vec![0i64; n];
    let mut min2 = vec![0i64; n];
    let mut max1 = vec![0i64; n];
    let mut max2 = vec![0i64; n];

    for d in 0..n {
        let size1 = dims1[d] as i64;
        let size2 = dims2[d] as i64;
        let s = shift[d];

        let overlap = if s >= 0 {
            // image2 starts inside (or past) image1
            if s >= size1 {
                return None;
            }
            min1[d] = s;
            min2[d] = 0;
            (size1 - s).min(size2)
        } else {
            // image1 starts inside (or past) image2
            if s <= -size2 {
                return None;
            }
            min1[d] = 0;
            min2[d] = -s;
            (size2 + s).min(size1)
        };

        if overlap <= 0 {
            return None;
        }
        max1[d] = min1[d] + overlap - 1;
        max2[d] = min2[d] + overlap - 1;
    }

    Some((Interval::new(min1, max1), Interval::new(min2, max2)))
}
