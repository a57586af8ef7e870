//! Job and instance models.
//!
//! An instance is an ordered list of jobs competing for a single machine.
//! Job positions are the identifiers used throughout the formulations.
//!
//! # Time Representation
//! All times are integer units relative to t=0, when the machine becomes
//! available. There are no release dates: every job may start at t=0.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::Schedule;
use crate::error::FormulationError;
use crate::validation::validate_columns;

/// A job to be processed on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Processing time (≥ 1).
    pub processing_time: i64,
    /// Due date (≥ 0).
    pub due_date: i64,
    /// Tardiness cost per time unit (≥ 0).
    pub cost: i64,
}

impl Job {
    /// Creates a job.
    pub fn new(processing_time: i64, due_date: i64, cost: i64) -> Self {
        Self {
            processing_time,
            due_date,
            cost,
        }
    }

    /// Tardiness if the job starts at `start`: `max(0, start - due_date)`.
    ///
    /// Lateness is measured from the start time, matching both formulations.
    #[inline]
    pub fn tardiness(&self, start: i64) -> i64 {
        (start - self.due_date).max(0)
    }

    /// Tardiness weighted by the job's cost.
    #[inline]
    pub fn weighted_tardiness(&self, start: i64) -> i64 {
        self.cost * self.tardiness(start)
    }
}

/// A single-machine weighted tardiness instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Jobs, indexed by position.
    pub jobs: Vec<Job>,
}

impl Instance {
    /// Creates an instance from jobs.
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// Assembles an instance from parallel columns.
    ///
    /// Fails with `InvalidInstance` if the columns differ in length.
    /// Value ranges are checked when a formulation is built.
    pub fn from_columns(
        processing_times: &[i64],
        due_dates: &[i64],
        costs: &[i64],
    ) -> Result<Self, FormulationError> {
        validate_columns(processing_times, due_dates, costs)
            .map_err(FormulationError::InvalidInstance)?;

        let jobs = processing_times
            .iter()
            .zip(due_dates)
            .zip(costs)
            .map(|((&p, &d), &c)| Job::new(p, d, c))
            .collect();
        Ok(Self { jobs })
    }

    /// Instance with only processing times: due dates 0, unit costs.
    ///
    /// With these defaults the objective is the total start time.
    pub fn from_processing_times(processing_times: &[i64]) -> Self {
        Self {
            jobs: processing_times.iter().map(|&p| Job::new(p, 0, 1)).collect(),
        }
    }

    /// Number of jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Sum of all processing times (the idle-free horizon).
    pub fn total_processing_time(&self) -> i64 {
        self.jobs.iter().map(|j| j.processing_time).sum()
    }

    /// Builds the idle-free schedule that processes jobs in `sequence` order.
    ///
    /// Fails with `InvalidSequence` unless `sequence` is a permutation of
    /// `0..job_count()`.
    pub fn schedule_from_sequence(&self, sequence: &[usize]) -> Result<Schedule, FormulationError> {
        let n = self.jobs.len();
        if sequence.len() != n {
            return Err(FormulationError::InvalidSequence(format!(
                "expected {n} jobs, got {}",
                sequence.len()
            )));
        }

        let mut seen = vec![false; n];
        let mut start_times = vec![0; n];
        let mut end_times = vec![0; n];
        let mut clock = 0;

        for &j in sequence {
            if j >= n || seen[j] {
                return Err(FormulationError::InvalidSequence(format!(
                    "job {j} is out of range or repeated"
                )));
            }
            seen[j] = true;
            start_times[j] = clock;
            clock += self.jobs[j].processing_time;
            end_times[j] = clock;
        }

        Ok(Schedule::new(start_times, end_times))
    }

    /// Total weighted tardiness of a schedule: `Σ c_j · max(0, S_j - d_j)`.
    ///
    /// Jobs missing from the schedule contribute nothing.
    pub fn objective(&self, schedule: &Schedule) -> i64 {
        self.jobs
            .iter()
            .zip(&schedule.start_times)
            .map(|(job, &start)| job.weighted_tardiness(start))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Instance {
        Instance::from_columns(&[10, 11, 14], &[24, 22, 37], &[15, 18, 18]).unwrap()
    }

    #[test]
    fn test_from_columns() {
        let instance = sample();
        assert_eq!(instance.job_count(), 3);
        assert_eq!(instance.jobs[1], Job::new(11, 22, 18));
        assert_eq!(instance.total_processing_time(), 35);
    }

    #[test]
    fn test_from_columns_mismatch() {
        let err = Instance::from_columns(&[1, 2], &[0], &[1, 1]).unwrap_err();
        assert!(matches!(err, FormulationError::InvalidInstance(_)));
    }

    #[test]
    fn test_from_processing_times_defaults() {
        let instance = Instance::from_processing_times(&[3, 4]);
        assert!(instance.jobs.iter().all(|j| j.due_date == 0 && j.cost == 1));
    }

    #[test]
    fn test_job_tardiness() {
        let job = Job::new(5, 10, 3);
        assert_eq!(job.tardiness(4), 0);
        assert_eq!(job.tardiness(10), 0);
        assert_eq!(job.tardiness(13), 3);
        assert_eq!(job.weighted_tardiness(13), 9);
    }

    #[test]
    fn test_schedule_from_sequence() {
        let instance = sample();
        let s = instance.schedule_from_sequence(&[2, 0, 1]).unwrap();
        assert_eq!(s.start_times, vec![14, 24, 0]);
        assert_eq!(s.end_times, vec![24, 35, 14]);
        assert!(s.is_feasible());
    }

    #[test]
    fn test_schedule_from_invalid_sequence() {
        let instance = sample();
        assert!(instance.schedule_from_sequence(&[0, 1]).is_err());
        assert!(instance.schedule_from_sequence(&[0, 0, 1]).is_err());
        assert!(instance.schedule_from_sequence(&[0, 1, 3]).is_err());
    }

    #[test]
    fn test_objective() {
        let instance = sample();
        // 0,1,2: starts 0, 10, 21 → all on time
        let s = instance.schedule_from_sequence(&[0, 1, 2]).unwrap();
        assert_eq!(instance.objective(&s), 0);

        // 2,1,0: starts 25, 14, 0 → job 0 late by 1 (cost 15)
        let s = instance.schedule_from_sequence(&[2, 1, 0]).unwrap();
        assert_eq!(instance.objective(&s), 15);
    }

    #[test]
    fn test_serde_roundtrip() {
        let instance = sample();
        let json = serde_json::to_string(&instance).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, instance);
    }
}
