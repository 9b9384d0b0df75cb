use std::ops::Range;

use crate::consts::{PARALLEL_SAMPLE_THRESHOLD, TASKS_PER_THREAD};
use crate::interval::Interval;

/// A contiguous run of a linear index range handed to one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Portion {
    pub start: usize,
    pub len: usize,
}

impl Portion {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Number of hardware threads, falling back to one when it cannot be queried.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Number of portions to split `total` samples into.
///
/// Small workloads stay in a single portion; larger ones get
/// [`TASKS_PER_THREAD`] portions per hardware thread.
pub fn portion_count(total: usize) -> usize {
    if total < PARALLEL_SAMPLE_THRESHOLD {
        1
    } else {
        TASKS_PER_THREAD * available_parallelism()
    }
}

/// Split `0..total` into at most `parts` ordered, disjoint portions.
///
/// Portion lengths differ by at most one; longer portions come first. Empty
/// portions are never produced, so fewer than `parts` portions are returned
/// when `total < parts`.
pub fn divide_into_portions(total: usize, parts: usize) -> Vec<Portion> {
    if total == 0 || parts == 0 {
        return Vec::new();
    }

    let parts = parts.min(total);
    let base = total / parts;
    let remainder = total % parts;

    let mut portions = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < remainder);
        portions.push(Portion { start, len });
        start += len;
    }
    portions
}

/// Split `region` into at most `parts` slabs along its largest dimension.
///
/// Slabs keep every other axis intact and their extents along the split axis
/// differ by at most one. An empty region yields no slabs.
pub fn split_along_largest_dimension(region: &Interval, parts: usize) -> Vec<Interval> {
    if region.is_empty() || parts == 0 {
        return Vec::new();
    }
    let Some(axis) = region.largest_dimension() else {
        // zero-dimensional: a single position
        return vec![region.clone()];
    };

    divide_into_portions(region.dimension(axis), parts)
        .into_iter()
        .map(|portion| {
            let mut min = region.min().to_vec();
            let mut max = region.max().to_vec();
            min[axis] = region.min()[axis] + portion.start as i64;
            max[axis] = region.min()[axis] + portion.end() as i64 - 1;
            Interval::new(min, max)
        })
        .collect()
}
