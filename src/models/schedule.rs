//! Schedule (solution) model.
//!
//! A schedule assigns every job a start and end time on the single
//! machine. Index `j` in both vectors refers to job `j` of the instance.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

/// Start and end times per job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Start time of each job.
    pub start_times: Vec<i64>,
    /// End time of each job.
    pub end_times: Vec<i64>,
}

impl Schedule {
    /// Creates a schedule from parallel start/end vectors.
    pub fn new(start_times: Vec<i64>, end_times: Vec<i64>) -> Self {
        Self {
            start_times,
            end_times,
        }
    }

    /// Number of scheduled jobs.
    pub fn job_count(&self) -> usize {
        self.start_times.len()
    }

    /// Latest end time (0 for an empty schedule).
    pub fn makespan(&self) -> i64 {
        self.end_times.iter().copied().max().unwrap_or(0)
    }

    /// Jobs ordered by start time; ties keep job order.
    pub fn sequence(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.start_times.len()).collect();
        order.sort_by_key(|&j| (self.start_times[j], j));
        order
    }

    /// First pair of consecutive jobs (by start time) that overlap.
    ///
    /// Returns `(earlier, later)` where `later` starts before `earlier` ends.
    pub fn find_overlap(&self) -> Option<(usize, usize)> {
        self.sequence()
            .windows(2)
            .find(|w| self.start_times[w[1]] < self.end_times[w[0]])
            .map(|w| (w[0], w[1]))
    }

    /// Whether no two jobs overlap on the machine.
    pub fn is_feasible(&self) -> bool {
        self.find_overlap().is_none()
    }

    /// Total time the machine sits idle between t=0 and the makespan.
    pub fn idle_time(&self) -> i64 {
        let mut clock = 0;
        let mut idle = 0;
        for j in self.sequence() {
            idle += (self.start_times[j] - clock).max(0);
            clock = clock.max(self.end_times[j]);
        }
        idle
    }

    /// The same job order with every idle gap removed.
    ///
    /// Tardiness never increases when a job starts earlier, so the
    /// left-shifted schedule is at least as good as `self`.
    pub fn left_shifted(&self) -> Schedule {
        let n = self.start_times.len();
        let mut start_times = vec![0; n];
        let mut end_times = vec![0; n];
        let mut clock = 0;

        for j in self.sequence() {
            let duration = self.end_times[j] - self.start_times[j];
            start_times[j] = clock;
            clock += duration;
            end_times[j] = clock;
        }

        Schedule::new(start_times, end_times)
    }
}
