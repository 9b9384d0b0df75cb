//! Expansion of a PCM maximum into the real-space shifts it may stand for.
//!
//! The PCM is the circular correlation of two images padded to a common
//! extent, so a peak at `p` is indistinguishable from `p - extent` along every
//! axis. Differently padded images also displace the peak by half the
//! difference of their paddings; that offset is removed before the `2^n`
//! sign combinations are enumerated.

use crate::error::{PhaseCorrError, Result};
use crate::extension::size_difference;
use crate::peak::PhaseCorrelationPeak;
use crate::periodic::wrap;

/// Extents of a PCM and the two images it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShiftGeometry {
    pcm_dims: Vec<usize>,
    offset: Vec<i64>,
}

impl ShiftGeometry {
    pub fn new(pcm_dims: &[usize], img1_dims: &[usize], img2_dims: &[usize]) -> Result<Self> {
        let n = pcm_dims.len();
        for dims in [img1_dims, img2_dims] {
            if dims.len() != n {
                return Err(PhaseCorrError::DimensionMismatch {
                    expected: n,
                    got: dims.len(),
                });
            }
        }

        let extension1 = size_difference(img1_dims, pcm_dims);
        let extension2 = size_difference(img2_dims, pcm_dims);
        let offset = extension1
            .iter()
            .zip(&extension2)
            .map(|(e1, e2)| (e2 - e1) / 2)
            .collect();

        Ok(Self {
            pcm_dims: pcm_dims.to_vec(),
            offset,
        })
    }

    pub fn ndim(&self) -> usize {
        self.pcm_dims.len()
    }

    pub fn pcm_dims(&self) -> &[usize] {
        &self.pcm_dims
    }

    /// Per-axis correction `(extension2 - extension1) / 2`, truncated toward
    /// zero.
    pub fn offset(&self) -> &[i64] {
        &self.offset
    }

    /// Raw PCM position moved by the padding offset and reduced into
    /// `0..extent` on every axis.
    pub fn corrected_position(&self, pcm_position: &[i64]) -> Vec<i64> {
        pcm_position
            .iter()
            .zip(&self.offset)
            .zip(&self.pcm_dims)
            .map(|((&p, &o), &extent)| wrap(p + o, extent) as i64)
            .collect()
    }

    /// The `2^n` integer shifts a PCM position can represent.
    ///
    /// Entry `i` mirrors axis `d` around zero when bit `d` of `i` is clear,
    /// so entry `2^n - 1` is the corrected position itself.
    pub fn possible_shifts(&self, pcm_position: &[i64]) -> Vec<Vec<i64>> {
        let base = self.corrected_position(pcm_position);
        let n = self.ndim();

        (0..1usize << n)
            .map(|i| {
                base.iter()
                    .enumerate()
                    .map(|(d, &x)| {
                        if (i >> d) & 1 == 0 {
                            let extent = self.pcm_dims[d] as i64;
                            if x < 0 {
                                x + extent
                            } else {
                                x - extent
                            }
                        } else {
                            x
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Inverse of the expansion: the raw PCM position a real-space shift
    /// came from.
    pub fn canonical_pcm_position(&self, shift: &[i64]) -> Vec<i64> {
        shift
            .iter()
            .zip(&self.offset)
            .zip(&self.pcm_dims)
            .map(|((&s, &o), &extent)| wrap(s - o, extent) as i64)
            .collect()
    }

    /// Expand one maximum into `2^n` candidates sharing its PCM metadata.
    pub fn expand(&self, peak: &PhaseCorrelationPeak) -> Vec<PhaseCorrelationPeak> {
        let fraction = peak.subpixel_offset();

        self.possible_shifts(&peak.pcm_position)
            .into_iter()
            .map(|shift| {
                let mut candidate = peak.clone();
                candidate.subpixel_shift = fraction.as_ref().map(|frac| {
                    shift
                        .iter()
                        .zip(frac)
                        .map(|(&s, f)| s as f64 + f)
                        .collect()
                });
                candidate.shift = Some(shift);
                candidate
            })
            .collect()
    }

    /// Expand every maximum of a list, keeping the list order.
    pub fn expand_all(&self, peaks: &[PhaseCorrelationPeak]) -> Vec<PhaseCorrelationPeak> {
        peaks.iter().flat_map(|p| self.expand(p)).collect()
    }
}

/// Expand a single PCM maximum into all shift hypotheses.
pub fn expand_peak_to_possible_shifts(
    peak: &PhaseCorrelationPeak,
    pcm_dims: &[usize],
    img1_dims: &[usize],
    img2_dims: &[usize],
) -> Result<Vec<PhaseCorrelationPeak>> {
    Ok(ShiftGeometry::new(pcm_dims, img1_dims, img2_dims)?.expand(peak))
}

/// Replace a list of PCM maxima with all of their shift hypotheses.
pub fn expand_peaks(
    peaks: &mut Vec<PhaseCorrelationPeak>,
    pcm_dims: &[usize],
    img1_dims: &[usize],
    img2_dims: &[usize],
) -> Result<()> {
    let geometry = ShiftGeometry::new(pcm_dims, img1_dims, img2_dims)?;
    *peaks = geometry.expand_all(peaks);
    Ok(())
}
