//! Split → run → join → merge helper shared by every parallel operation.
//!
//! Each work item runs as its own task on a caller-owned Rayon pool. A task
//! that panics is caught at the join point, logged, and left out of the
//! results; the number of such tasks is reported back so callers can flag a
//! partial result.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ndarray::{ArrayViewMutD, Axis};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::error::Result;
use crate::portion::{available_parallelism, divide_into_portions};

/// Results of the tasks that completed plus the number that failed.
#[derive(Clone, Debug)]
pub struct TaskReport<T> {
    pub results: Vec<T>,
    pub failed: usize,
}

impl<T> TaskReport<T> {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Build a fixed-size pool; `None` sizes it to the available parallelism.
pub fn build_pool(threads: Option<usize>) -> Result<ThreadPool> {
    let threads = threads.unwrap_or_else(available_parallelism).max(1);
    Ok(ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Run `task` once per item of `work` on `pool` and collect the results in
/// input order. Blocks until every task has finished.
pub fn run_tasks<W, T, F>(pool: &ThreadPool, work: &[W], task: F) -> TaskReport<T>
where
    W: Sync,
    T: Send,
    F: Fn(&W) -> T + Sync,
{
    let outcomes: Vec<std::thread::Result<T>> = pool.install(|| {
        work.par_iter()
            .map(|item| panic::catch_unwind(AssertUnwindSafe(|| task(item))))
            .collect()
    });

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => results.push(value),
            Err(payload) => {
                failed += 1;
                warn!(
                    task = index,
                    error = %panic_message(payload.as_ref()),
                    "Parallel task failed, dropping its contribution"
                );
            }
        }
    }

    TaskReport { results, failed }
}

/// Run `task` with exclusive access to each item of `work`.
///
/// Every item is touched by exactly one task. Returns the indices of the
/// items whose task panicked; their state may be partially updated and must
/// be reset by the caller.
pub fn run_tasks_mut<W, F>(pool: &ThreadPool, work: &mut [W], task: F) -> Vec<usize>
where
    W: Send,
    F: Fn(&mut W) + Sync,
{
    let outcomes: Vec<bool> = pool.install(|| {
        work.par_iter_mut()
            .enumerate()
            .map(|(index, item)| {
                match panic::catch_unwind(AssertUnwindSafe(|| task(item))) {
                    Ok(()) => true,
                    Err(payload) => {
                        warn!(
                            task = index,
                            error = %panic_message(payload.as_ref()),
                            "Parallel task failed, dropping its contribution"
                        );
                        false
                    }
                }
            })
            .collect()
    });

    outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, ok)| (!ok).then_some(index))
        .collect()
}

/// A disjoint mutable slab of a larger array.
pub struct ViewPiece<'a, T> {
    /// Axis the parent was split along, if it was split at all.
    pub axis: Option<usize>,
    /// Position of the slab's first sample along `axis` in the parent.
    pub offset: usize,
    pub view: ArrayViewMutD<'a, T>,
}

/// Split a mutable view into at most `parts` slabs along its longest axis.
pub fn split_view_mut<T>(view: ArrayViewMutD<'_, T>, parts: usize) -> Vec<ViewPiece<'_, T>> {
    let shape = view.shape().to_vec();
    let axis = (0..shape.len()).fold(None, |best: Option<usize>, d| match best {
        Some(b) if shape[b] >= shape[d] => Some(b),
        _ => Some(d),
    });

    let Some(axis) = axis else {
        return vec![ViewPiece {
            axis: None,
            offset: 0,
            view,
        }];
    };

    let portions = divide_into_portions(shape[axis], parts);
    let mut pieces = Vec::with_capacity(portions.len());
    let mut rest = view;
    for (i, portion) in portions.iter().enumerate() {
        if i + 1 == portions.len() {
            pieces.push(ViewPiece {
                axis: Some(axis),
                offset: portion.start,
                view: rest,
            });
            break;
        }
        let (head, tail) = rest.split_at(Axis(axis), portion.len);
        pieces.push(ViewPiece {
            axis: Some(axis),
            offset: portion.start,
            view: head,
        });
        rest = tail;
    }
    pieces
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
