//! Extent arithmetic for padding two images into a common PCM extent.

/// Per-axis `dims2 - dims1`.
pub fn size_difference(dims1: &[usize], dims2: &[usize]) -> Vec<i64> {
    dims1
        .iter()
        .zip(dims2)
        .map(|(&a, &b)| b as i64 - a as i64)
        .collect()
}

/// Extent big enough to hold both images, enlarged by `extension` samples on
/// each side of every axis but never by more than the larger image extent.
pub fn extended_size(dims1: &[usize], dims2: &[usize], extension: &[usize]) -> Vec<usize> {
    dims1
        .iter()
        .zip(dims2)
        .zip(extension)
        .map(|((&a, &b), &ext)| {
            let larger = a.max(b);
            larger + 2 * ext.min(larger)
        })
        .collect()
}

/// Per-side extension that enlarges each axis by `factor` of its extent.
pub fn extension_by_factor(dims: &[usize], factor: f64) -> Vec<usize> {
    dims.iter()
        .map(|&d| (d as f64 * factor).max(0.0) as usize)
        .collect()
}

/// Padding on the low side of each axis when `img_dims` is centered in
/// `extended_dims`.
pub fn extension_per_side(img_dims: &[usize], extended_dims: &[usize]) -> Vec<usize> {
    size_difference(img_dims, extended_dims)
        .into_iter()
        .map(|d| (d.max(0) / 2) as usize)
        .collect()
}

/// Low-side placement of both images inside a PCM extent.
///
/// Image1 is centered; image2 is placed so that the difference of the two
/// placements is exactly the offset the shift expansion corrects for, which
/// makes the recovered integer shift exact for odd padding differences too.
pub fn padding_origins(
    pcm_dims: &[usize],
    img1_dims: &[usize],
    img2_dims: &[usize],
) -> (Vec<usize>, Vec<usize>) {
    let ext1 = size_difference(img1_dims, pcm_dims);
    let ext2 = size_difference(img2_dims, pcm_dims);

    let origin1: Vec<usize> = ext1.iter().map(|&e| (e.max(0) / 2) as usize).collect();
    let origin2 = origin1
        .iter()
        .zip(ext1.iter().zip(&ext2))
        .map(|(&o1, (&e1, &e2))| {
            let o2 = o1 as i64 + (e2 - e1) / 2;
            o2.clamp(0, e2.max(0)) as usize
        })
        .collect();

    (origin1, origin2)
}
