use ndarray::ArrayViewD;

/// Read-only view of an n-dimensional array that wraps around at every edge.
#[derive(Clone, Debug)]
pub struct PeriodicView<'a> {
    data: ArrayViewD<'a, f64>,
}

impl<'a> PeriodicView<'a> {
    pub fn new(data: ArrayViewD<'a, f64>) -> Self {
        Self { data }
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &ArrayViewD<'a, f64> {
        &self.data
    }

    /// Value at `position`, reduced modulo the extent of each axis.
    ///
    /// `index` is scratch space of length `ndim()` reused across calls.
    pub fn get(&self, position: &[i64], index: &mut [usize]) -> f64 {
        for (d, (slot, &p)) in index.iter_mut().zip(position).enumerate() {
            *slot = wrap(p, self.data.shape()[d]);
        }
        self.data[&*index]
    }

    /// Value one step away from `position` along `axis`.
    pub fn neighbor(&self, position: &[i64], axis: usize, step: i64, index: &mut [usize]) -> f64 {
        for (d, (slot, &p)) in index.iter_mut().zip(position).enumerate() {
            let p = if d == axis { p + step } else { p };
            *slot = wrap(p, self.data.shape()[d]);
        }
        self.data[&*index]
    }
}

/// Non-negative residue of `coordinate` modulo `extent`.
pub fn wrap(coordinate: i64, extent: usize) -> usize {
    coordinate.rem_euclid(extent as i64) as usize
}
