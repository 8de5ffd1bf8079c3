//! Partition planner: maps the embedding table onto the worker set.
//!
//! Each worker owns one contiguous row range. Ranges are non-overlapping,
//! cover the table exactly, and differ in size by at most one row; the
//! remainder rows go to the first `N mod W` workers.

use crate::embedding::WorkerId;
use crate::error::{ShardError, ShardResult};
use std::ops::Range;

/// One worker's slice of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: WorkerId,
    pub start: usize,
    pub len: usize,
}

impl Partition {
    /// Returns the half-open row range this partition owns.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// The full assignment of rows to workers, computed once at startup.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Plans a partition of `total_rows` across `worker_count` workers.
    ///
    /// Fails when there are no workers, or when a worker would own zero
    /// rows; the harvester treats workers as always able to contribute
    /// until exhausted, so empty partitions are rejected up front.
    pub fn new(total_rows: usize, worker_count: usize) -> ShardResult<Self> {
        if worker_count < 1 {
            return Err(ShardError::Configuration {
                reason: "worker count must be at least 1".to_string(),
            });
        }
        if total_rows < worker_count {
            return Err(ShardError::Configuration {
                reason: format!(
                    "{total_rows} rows cannot be split across {worker_count} workers; every worker must own at least one row"
                ),
            });
        }

        let quotient = total_rows / worker_count;
        let remainder = total_rows % worker_count;
        let partitions = (0..worker_count)
            .map(|i| {
                let start = i * quotient + i.min(remainder);
                let end = (i + 1) * quotient + (i + 1).min(remainder);
                Partition {
                    worker: WorkerId::new(i as u16),
                    start,
                    len: end - start,
                }
            })
            .collect();

        Ok(Self { partitions })
    }

    /// Returns all partitions in worker-id order.
    #[must_use]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Returns the number of workers in the plan.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.partitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_coverage(total_rows: usize, worker_count: usize) {
        let plan = PartitionPlan::new(total_rows, worker_count).unwrap();
        let parts = plan.partitions();

        assert_eq!(parts.len(), worker_count);

        // Contiguous and covering exactly [0, total_rows)
        let mut next = 0;
        for part in parts {
            assert_eq!(part.start, next, "ranges must be contiguous");
            assert!(part.len >= 1, "every worker owns at least one row");
            next = part.start + part.len;
        }
        assert_eq!(next, total_rows, "union must be the whole table");

        // Sizes differ by at most one
        let min = parts.iter().map(|p| p.len).min().unwrap();
        let max = parts.iter().map(|p| p.len).max().unwrap();
        assert!(max - min <= 1, "sizes must differ by at most one row");
    }

    #[test]
    fn test_coverage_across_shapes() {
        for total_rows in 1..=40 {
            for worker_count in 1..=total_rows {
                check_coverage(total_rows, worker_count);
            }
        }
    }

    #[test]
    fn test_even_split() {
        let plan = PartitionPlan::new(10, 2).unwrap();
        let parts = plan.partitions();
        assert_eq!(parts[0].range(), 0..5);
        assert_eq!(parts[1].range(), 5..10);
    }

    #[test]
    fn test_remainder_goes_to_first_workers() {
        let plan = PartitionPlan::new(10, 3).unwrap();
        let parts = plan.partitions();
        assert_eq!(parts[0].range(), 0..4);
        assert_eq!(parts[1].range(), 4..7);
        assert_eq!(parts[2].range(), 7..10);
    }

    #[test]
    fn test_single_worker_owns_everything() {
        let plan = PartitionPlan::new(7, 1).unwrap();
        assert_eq!(plan.partitions()[0].range(), 0..7);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = PartitionPlan::new(10, 0).unwrap_err();
        assert!(matches!(err, ShardError::Configuration { .. }));
    }

    #[test]
    fn test_more_workers_than_rows_rejected() {
        let err = PartitionPlan::new(2, 3).unwrap_err();
        assert!(matches!(err, ShardError::Configuration { .. }));
    }
}
