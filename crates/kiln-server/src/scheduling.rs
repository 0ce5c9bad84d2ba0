//! Scheduling policy for analysis batches.
//!
//! Small batches run on the request thread. Larger ones fan out over the
//! rayon pool; results are collected in input order and only returned once
//! every worker has finished, so callers never see a partial batch.

use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    Sequential,
    Parallel,
}

impl SchedulingMode {
    /// Parallel only when the batch is larger than `threshold`.
    pub fn for_batch(batch_len: usize, threshold: usize) -> Self {
        if batch_len > threshold {
            SchedulingMode::Parallel
        } else {
            SchedulingMode::Sequential
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchedulingMode::Sequential => "sequential",
            SchedulingMode::Parallel => "parallel",
        }
    }

    /// Apply `work` to every item under this mode, preserving input order.
    pub fn run<T, R, F>(self, items: &[T], work: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            SchedulingMode::Sequential => items.iter().map(work).collect(),
            SchedulingMode::Parallel => items.par_iter().map(work).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::limits::PARALLEL_CHECK_THRESHOLD;

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(
            SchedulingMode::for_batch(0, PARALLEL_CHECK_THRESHOLD),
            SchedulingMode::Sequential
        );
        assert_eq!(
            SchedulingMode::for_batch(5, PARALLEL_CHECK_THRESHOLD),
            SchedulingMode::Sequential
        );
        assert_eq!(
            SchedulingMode::for_batch(6, PARALLEL_CHECK_THRESHOLD),
            SchedulingMode::Parallel
        );
    }

    #[test]
    fn test_parallel_run_preserves_order() {
        let items: Vec<u32> = (0..100).collect();
        let doubled = SchedulingMode::Parallel.run(&items, |n| n * 2);
        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_run_stays_on_caller() {
        let items: Vec<u32> = (0..64).collect();
        let caller = std::thread::current().id();
        let on_caller =
            SchedulingMode::Sequential.run(&items, |_| std::thread::current().id());
        assert!(on_caller.iter().all(|id| *id == caller));
    }
}
