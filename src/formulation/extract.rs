//! Schedule reconstruction from solved variable values.

use crate::error::FormulationError;
use crate::models::{Instance, Schedule};
use crate::solver::{SolveStatus, SolverAdapter};

use super::discretize::Discretization;
use super::registry::{BucketVariables, TimeVariables};

/// Turns solved variable values into integer start times.
///
/// Start times are reconstructed as
/// - BI: `Σ Δ(b·z[j,b,k] - u[j,b,k])` over the job's assignments
/// - TI: `Σ (t - 1)·x[j,t]`
///
/// and rounded to the nearest integer. With a tolerance set, a value
/// farther than `tolerance` from its rounding is rejected instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleExtractor {
    tolerance: Option<f64>,
}

impl ScheduleExtractor {
    pub fn new(tolerance: Option<f64>) -> Self {
        Self { tolerance }
    }

    /// Schedule of a solved bucket-indexed model.
    pub fn from_buckets<S: SolverAdapter>(
        &self,
        instance: &Instance,
        disc: &Discretization,
        vars: &BucketVariables<S::Var>,
        solver: &S,
    ) -> Result<Schedule, FormulationError> {
        let delta = disc.delta() as f64;
        let mut raw = vec![0.0; instance.job_count()];
        for idx in vars.index_set().iter() {
            let z = value(solver, vars.require_z(idx)?)?;
            let u = value(solver, vars.require_u(idx)?)?;
            raw[idx.job] += delta * (idx.bucket as f64 * z - u);
        }
        self.finish(instance, &raw)
    }

    /// Schedule of a solved time-indexed model.
    pub fn from_slots<S: SolverAdapter>(
        &self,
        instance: &Instance,
        vars: &TimeVariables<S::Var>,
        solver: &S,
    ) -> Result<Schedule, FormulationError> {
        let mut raw = vec![0.0; instance.job_count()];
        for idx in vars.index_set().iter() {
            let x = value(solver, vars.require_x(idx)?)?;
            raw[idx.job] += (idx.slot - 1) as f64 * x;
        }
        self.finish(instance, &raw)
    }

    /// Rounds one reconstructed start time.
    pub fn round_start(&self, job: usize, raw: f64) -> Result<i64, FormulationError> {
        let rounded = raw.round();
        if let Some(tol) = self.tolerance {
            if (raw - rounded).abs() > tol {
                return Err(FormulationError::NonIntegralValue { job, value: raw });
            }
        }
        Ok(rounded as i64)
    }

    fn finish(&self, instance: &Instance, raw: &[f64]) -> Result<Schedule, FormulationError> {
        let start_times = raw
            .iter()
            .enumerate()
            .map(|(j, &r)| self.round_start(j, r))
            .collect::<Result<Vec<i64>, _>>()?;
        let end_times = start_times
            .iter()
            .zip(&instance.jobs)
            .map(|(s, job)| s + job.processing_time)
            .collect();
        Ok(Schedule::new(start_times, end_times))
    }
}

fn value<S: SolverAdapter>(solver: &S, var: S::Var) -> Result<f64, FormulationError> {
    solver
        .value(var)
        .ok_or(FormulationError::UnsolvedModel(Some(SolveStatus::Optimal)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_without_tolerance() {
        let ex = ScheduleExtractor::default();
        assert_eq!(ex.round_start(0, 4.49).unwrap(), 4);
        assert_eq!(ex.round_start(0, 4.51).unwrap(), 5);
        assert_eq!(ex.round_start(0, -1e-9).unwrap(), 0);
    }

    #[test]
    fn test_round_with_tolerance() {
        let ex = ScheduleExtractor::new(Some(1e-6));
        assert_eq!(ex.round_start(2, 7.0000001).unwrap(), 7);
        let err = ex.round_start(2, 7.3).unwrap_err();
        assert_eq!(err, FormulationError::NonIntegralValue { job: 2, value: 7.3 });
    }

    #[test]
    fn test_finish_adds_processing_times() {
        let instance = Instance::from_columns(&[3, 2], &[0, 0], &[1, 1]).unwrap();
        let schedule = ScheduleExtractor::default()
            .finish(&instance, &[2.0000004, 0.0])
            .unwrap();
        assert_eq!(schedule.start_times, vec![2, 0]);
        assert_eq!(schedule.end_times, vec![5, 2]);
    }
}
