/// An axis-aligned box of integer coordinates with inclusive bounds.
///
/// A dimension whose `max` is below its `min` has zero extent and makes the
/// whole interval empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    min: Vec<i64>,
    max: Vec<i64>,
}

impl Interval {
    pub fn new(min: Vec<i64>, max: Vec<i64>) -> Self {
        assert_eq!(min.len(), max.len(), "interval bounds must have equal length");
        Self { min, max }
    }

    /// Interval covering every sample of an array with the given shape.
    pub fn from_shape(shape: &[usize]) -> Self {
        Self {
            min: vec![0; shape.len()],
            max: shape.iter().map(|&s| s as i64 - 1).collect(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[i64] {
        &self.min
    }

    pub fn max(&self) -> &[i64] {
        &self.max
    }

    /// Extent along axis `d`.
    pub fn dimension(&self, d: usize) -> usize {
        (self.max[d] - self.min[d] + 1).max(0) as usize
    }

    pub fn dimensions(&self) -> Vec<usize> {
        (0..self.ndim()).map(|d| self.dimension(d)).collect()
    }

    /// Number of integer positions inside the interval.
    pub fn size(&self) -> usize {
        (0..self.ndim()).map(|d| self.dimension(d)).product()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, position: &[i64]) -> bool {
        position.len() == self.ndim()
            && position
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(&p, (&lo, &hi))| p >= lo && p <= hi)
    }

    /// The same box moved by `offset`.
    pub fn translate(&self, offset: &[i64]) -> Self {
        Self {
            min: self.min.iter().zip(offset).map(|(m, o)| m + o).collect(),
            max: self.max.iter().zip(offset).map(|(m, o)| m + o).collect(),
        }
    }

    /// Axis with the largest extent; the first one wins on ties.
    pub fn largest_dimension(&self) -> Option<usize> {
        (0..self.ndim()).fold(None, |best, d| match best {
            Some(b) if self.dimension(b) >= self.dimension(d) => Some(b),
            _ => Some(d),
        })
    }

    /// Visit every position in row-major order (last axis fastest).
    ///
    /// The slice handed to `f` is a reused cursor; copy it if it must outlive
    /// the call.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&[i64]),
    {
        if self.is_empty() {
            return;
        }
        let n = self.ndim();
        let mut cursor = self.min.clone();
        loop {
            f(&cursor);

            let mut d = n;
            loop {
                if d == 0 {
                    return;
                }
                d -= 1;
                if cursor[d] < self.max[d] {
                    cursor[d] += 1;
                    break;
                }
                cursor[d] = self.min[d];
            }
        }
    }
}
