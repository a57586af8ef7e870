//! Time-indexed (TI) formulation.
//!
//! One binary `x[j,t]` per job and start slot `t` (start time `t - 1`).
//! Tardiness is read straight off the index, so the objective carries
//! `c_j · max(0, t - 1 - d_j)` and no linking variables are needed.
//!
//! # Reference
//! Sousa & Wolsey (1992), "A time indexed formulation of non-preemptive
//! single machine scheduling problems", Math. Programming 54

use crate::error::FormulationError;
use crate::models::Instance;
use crate::solver::{LinearExpr, Relation, SolverAdapter};

use super::index::{TimeIndex, TimeIndexSet};
use super::registry::TimeVariables;

/// Emits the time-indexed model into a solver adapter.
pub(crate) struct TimeGenerator<'a, S: SolverAdapter> {
    instance: &'a Instance,
    solver: &'a mut S,
    vars: TimeVariables<S::Var>,
}

impl<'a, S: SolverAdapter> TimeGenerator<'a, S> {
    pub(crate) fn new(instance: &'a Instance, solver: &'a mut S) -> Self {
        let processing: Vec<i64> = instance.jobs.iter().map(|j| j.processing_time).collect();
        Self {
            instance,
            solver,
            vars: TimeVariables::new(TimeIndexSet::new(&processing)),
        }
    }

    #[tracing::instrument(level = "debug", name = "TI build", skip(self))]
    pub(crate) fn generate(mut self) -> Result<TimeVariables<S::Var>, FormulationError> {
        self.declare_vars()?;
        self.add_completion();
        self.add_capacity();

        tracing::debug!(x = self.vars.x.len(), "time-indexed variables declared");
        Ok(self.vars)
    }

    fn declare_vars(&mut self) -> Result<(), FormulationError> {
        let members: Vec<TimeIndex> = self.vars.set.iter().collect();
        for (pos, idx) in members.into_iter().enumerate() {
            let name = format!("x_{}_{}", idx.job, idx.slot);
            let solver = &mut *self.solver;
            let x = self
                .vars
                .x
                .get_or_declare(pos, || solver.declare_binary(&name))
                .ok_or_else(|| FormulationError::UnknownIndex(name.clone()))?;

            let job = &self.instance.jobs[idx.job];
            let weight = job.weighted_tardiness(idx.slot - 1);
            if weight != 0 {
                self.solver.set_objective_term(x, weight as f64);
            }
        }
        Ok(())
    }

    fn add_completion(&mut self) {
        for j in 0..self.vars.set.job_count() {
            let expr: LinearExpr<S::Var> = self
                .vars
                .set
                .iter_job(j)
                .filter_map(|idx| self.vars.x(idx.job, idx.slot))
                .map(|x| (x, 1.0))
                .collect();
            self.solver
                .add_linear_constraint(expr, Relation::Eq, 1.0, &format!("completion[{j}]"));
        }
    }

    /// At most one job occupies each unit slot: a start `s` covers `t`
    /// when `t - p_j < s ≤ t`.
    fn add_capacity(&mut self) {
        let horizon = self.instance.total_processing_time();
        for t in 1..=horizon {
            let mut expr = LinearExpr::new();
            for (j, job) in self.instance.jobs.iter().enumerate() {
                for s in (t - job.processing_time + 1).max(1)..=t {
                    if let Some(x) = self.vars.x(j, s) {
                        expr.add(x, 1.0);
                    }
                }
            }
            self.solver
                .add_linear_constraint(expr, Relation::LessEq, 1.0, &format!("capacity[{t}]"));
        }
    }
}
